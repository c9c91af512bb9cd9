use chrono::{Datelike, Duration, Utc};
use pkg_constants::ingress::{
    FAKE_CERTIFICATE_CN, FAKE_CERTIFICATE_DNS, FAKE_CERTIFICATE_VALID_DAYS,
};
use pkg_constants::paths::{DEFAULT_SSL_DIRECTORY, FAKE_CERTIFICATE_FILENAME};
use pkg_types::secret::SSLCert;
use rcgen::{CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};
use sha2::{Digest, Sha256};
use tracing::info;

/// Self-signed certificate served when no default certificate is configured
/// or the configured one cannot be loaded.
pub struct FakeCertificate {
    cert_pem: String,
    key_pem: String,
    cert: SSLCert,
}

impl FakeCertificate {
    /// Generate a fresh self-signed certificate for `ingress.local`.
    pub fn generate() -> anyhow::Result<Self> {
        info!("Generating default fake certificate");

        let now = Utc::now();
        let expires = now + Duration::days(FAKE_CERTIFICATE_VALID_DAYS);

        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, FAKE_CERTIFICATE_CN);
        params
            .distinguished_name
            .push(DnType::OrganizationName, "Acme Co");
        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params
            .subject_alt_names
            .push(rcgen::SanType::DnsName(FAKE_CERTIFICATE_DNS.try_into()?));
        params.not_before = rcgen::date_time_ymd(now.year(), now.month() as u8, now.day() as u8);
        params.not_after =
            rcgen::date_time_ymd(expires.year(), expires.month() as u8, expires.day() as u8);

        let key_pair = KeyPair::generate()?;
        let cert = params.self_signed(&key_pair)?;
        let cert_pem = cert.pem();
        let key_pem = key_pair.serialize_pem();

        let pem_cert_key = format!("{}{}", cert_pem, key_pem);
        let pem_sha = format!("{:x}", Sha256::digest(pem_cert_key.as_bytes()));

        info!("Default fake certificate generated (sha256={})", pem_sha);

        Ok(Self {
            cert: SSLCert {
                name: "default-fake-certificate".to_string(),
                namespace: String::new(),
                pem_file_name: format!("{}/{}", DEFAULT_SSL_DIRECTORY, FAKE_CERTIFICATE_FILENAME),
                pem_sha,
                cn: vec![FAKE_CERTIFICATE_CN.to_string(), FAKE_CERTIFICATE_DNS.to_string()],
                expire_time: Some(expires),
                pem_cert_key,
                ..Default::default()
            },
            cert_pem,
            key_pem,
        })
    }

    /// The certificate in the form synthesis consumes.
    pub fn ssl_cert(&self) -> &SSLCert {
        &self.cert
    }

    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    pub fn key_pem(&self) -> &str {
        &self.key_pem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_ingress_local_certificate() {
        let fake = FakeCertificate::generate().unwrap();
        let cert = fake.ssl_cert();

        assert!(fake.cert_pem().starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(fake.key_pem().contains("PRIVATE KEY"));
        assert!(cert.matches_host(FAKE_CERTIFICATE_DNS));
        assert_eq!(cert.pem_sha.len(), 64);
        assert!(cert.expire_time.unwrap() > Utc::now());
        assert!(cert.pem_file_name.ends_with(FAKE_CERTIFICATE_FILENAME));
    }
}
