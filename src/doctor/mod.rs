//! Doctor command for configuration and connectivity diagnostics
//!
//! Checks that both API keys and the index host are configured, then that
//! the OpenAI API and the Pinecone index actually answer.

use colored::*;

use crate::config::{mask_secret, Config};
use crate::providers::{OpenAiClient, PineconeIndex};

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass(String),
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self { name: name.to_string(), status }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
}

impl Doctor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = vec![
            self.check_openai_key(),
            self.check_pinecone_key(),
            self.check_index_host(),
        ];

        checks.push(self.check_openai_api().await);
        checks.push(self.check_pinecone_index().await);

        checks
    }

    /// Check 1: OpenAI API key
    fn check_openai_key(&self) -> HealthCheck {
        match self.config.openai_api_key() {
            Ok(key) => HealthCheck::new("OpenAI Key", HealthStatus::Pass(mask_secret(&key))),
            Err(e) => HealthCheck::new("OpenAI Key", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Check 2: Pinecone API key; only augmented lanes need it
    fn check_pinecone_key(&self) -> HealthCheck {
        match self.config.pinecone_api_key() {
            Ok(key) => HealthCheck::new("Pinecone Key", HealthStatus::Pass(mask_secret(&key))),
            Err(e) => HealthCheck::new(
                "Pinecone Key",
                HealthStatus::Warn(format!("{} (augmented lanes disabled)", e)),
            ),
        }
    }

    /// Check 3: Pinecone index host
    fn check_index_host(&self) -> HealthCheck {
        match self.config.pinecone_index_host() {
            Ok(host) => HealthCheck::new("Index Host", HealthStatus::Pass(host)),
            Err(e) => HealthCheck::new(
                "Index Host",
                HealthStatus::Warn(format!("{} (augmented lanes disabled)", e)),
            ),
        }
    }

    /// Check 4: OpenAI API reachable with the configured key
    async fn check_openai_api(&self) -> HealthCheck {
        let client = match OpenAiClient::from_config(&self.config) {
            Ok(client) => client,
            Err(e) => {
                return HealthCheck::new("OpenAI API", HealthStatus::Warn(format!("skipped: {}", e)))
            }
        };

        match client.health_check().await {
            Ok(()) => HealthCheck::new("OpenAI API", HealthStatus::Pass(client.base_url().to_string())),
            Err(e) => HealthCheck::new("OpenAI API", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Check 5: Pinecone index reachable and populated
    async fn check_pinecone_index(&self) -> HealthCheck {
        let index = match PineconeIndex::from_config(&self.config) {
            Ok(index) => index,
            Err(e) => {
                return HealthCheck::new("Pinecone Index", HealthStatus::Warn(format!("skipped: {}", e)))
            }
        };

        match index.describe_stats().await {
            Ok(stats) if stats.total_vector_count == 0 => HealthCheck::new(
                "Pinecone Index",
                HealthStatus::Warn("index is empty; every reference will be blank".to_string()),
            ),
            Ok(stats) => {
                let dimension = stats
                    .dimension
                    .map(|d| format!(", dimension {}", d))
                    .unwrap_or_default();
                HealthCheck::new(
                    "Pinecone Index",
                    HealthStatus::Pass(format!("{} vectors{}", stats.total_vector_count, dimension)),
                )
            }
            Err(e) => HealthCheck::new("Pinecone Index", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "PensionBot Diagnostics".bold().cyan());
        println!("{:<16} {}", "Check", "Status");
        println!("{}", "=".repeat(60));

        for check in checks {
            let line = match &check.status {
                HealthStatus::Pass(detail) => format!("{} {}", "PASS".green().bold(), detail.dimmed()),
                HealthStatus::Warn(msg) => format!("{} {}", "WARN".yellow().bold(), msg.yellow()),
                HealthStatus::Fail(msg) => format!("{} {}", "FAIL".red().bold(), msg.red()),
            };
            println!("{:<16} {}", check.name, line);
        }

        println!();
    }

    /// True when no check failed
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Config whose env-var names are unique to one test
    fn isolated_config(tag: &str) -> Config {
        let mut config = Config::default();
        config.openai.api_key_env = format!("PENSIONBOT_DOCTOR_{}_OPENAI", tag);
        config.pinecone.api_key_env = format!("PENSIONBOT_DOCTOR_{}_PINECONE", tag);
        config.pinecone.index_host_env = format!("PENSIONBOT_DOCTOR_{}_HOST", tag);
        config.pinecone.index_host = None;
        config
    }

    #[test]
    fn test_health_status_equality() {
        assert_eq!(HealthStatus::Pass("ok".to_string()), HealthStatus::Pass("ok".to_string()));
        assert_ne!(HealthStatus::Warn("x".to_string()), HealthStatus::Fail("x".to_string()));
    }

    #[test]
    fn test_overall_status() {
        let ok = vec![
            HealthCheck::new("A", HealthStatus::Pass(String::new())),
            HealthCheck::new("B", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&ok));

        let failed = vec![
            HealthCheck::new("A", HealthStatus::Pass(String::new())),
            HealthCheck::new("B", HealthStatus::Fail("error".to_string())),
        ];
        assert!(!Doctor::overall_status(&failed));
    }

    #[test]
    fn test_missing_keys() {
        let doctor = Doctor::new(isolated_config("MISSING"));

        let openai = doctor.check_openai_key();
        assert!(matches!(openai.status, HealthStatus::Fail(ref m) if m.contains("PENSIONBOT_DOCTOR_MISSING_OPENAI")));

        assert!(matches!(doctor.check_pinecone_key().status, HealthStatus::Warn(_)));
        assert!(matches!(doctor.check_index_host().status, HealthStatus::Warn(_)));
    }

    #[test]
    fn test_present_key_is_masked() {
        let config = isolated_config("PRESENT");
        std::env::set_var(&config.openai.api_key_env, "sk-abcdefghijklmnop");
        let doctor = Doctor::new(config);

        match doctor.check_openai_key().status {
            HealthStatus::Pass(detail) => assert!(!detail.contains("abcdefghijklmnop")),
            other => panic!("expected pass, got {:?}", other),
        }
    }

    #[test]
    fn test_index_host_from_config() {
        let mut config = isolated_config("HOST");
        config.pinecone.index_host = Some("https://pension-abc.svc.pinecone.io/".to_string());
        let doctor = Doctor::new(config);

        assert_eq!(
            doctor.check_index_host().status,
            HealthStatus::Pass("https://pension-abc.svc.pinecone.io".to_string())
        );
    }

    #[tokio::test]
    async fn test_network_checks_skip_without_keys() {
        let doctor = Doctor::new(isolated_config("SKIP"));
        let checks = doctor.run_diagnostics().await;

        assert_eq!(checks.len(), 5);
        assert!(matches!(checks[3].status, HealthStatus::Warn(ref m) if m.starts_with("skipped")));
        assert!(matches!(checks[4].status, HealthStatus::Warn(ref m) if m.starts_with("skipped")));
        assert!(!Doctor::overall_status(&checks));
    }
}
