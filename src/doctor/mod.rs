//! Doctor command for system diagnostics.
//!
//! Checks the things the assistant needs before serving: a model cache or a
//! way to fill it, enough disk and memory for the weights, a reachable
//! transcription service, and an input device for voice queries.

use colored::Colorize;
use reqwest::Client;
use std::time::Duration;
use sysinfo::System;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

/// Doctor diagnostics system
pub struct Doctor {
    model_id: String,
    transcribe_url: String,
}

impl Doctor {
    pub fn new(model_id: String, transcribe_url: String) -> Self {
        Self {
            model_id,
            transcribe_url,
        }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        checks.push(self.check_model_cache());
        checks.push(self.check_disk_space());
        checks.push(self.check_memory());
        checks.push(self.check_transcription_service().await);
        checks.push(self.check_input_device());

        checks
    }

    /// Check 1: model weights cached locally
    fn check_model_cache(&self) -> HealthCheck {
        let name = "Model Cache".to_string();
        let Some(home) = dirs::home_dir() else {
            return HealthCheck {
                name,
                status: HealthStatus::Warn("Could not determine home directory".to_string()),
            };
        };
        let snapshot = home
            .join(".cache")
            .join("huggingface")
            .join("hub")
            .join(format!("models--{}", self.model_id.replace('/', "--")));
        if snapshot.exists() {
            HealthCheck {
                name,
                status: HealthStatus::Pass,
            }
        } else {
            HealthCheck {
                name,
                status: HealthStatus::Warn(format!(
                    "{} not cached yet; it will be downloaded on first start",
                    self.model_id
                )),
            }
        }
    }

    /// Check 2: disk space for model weights
    fn check_disk_space(&self) -> HealthCheck {
        use sysinfo::Disks;
        let disks = Disks::new_with_refreshed_list();
        let name = "Disk Space".to_string();

        let available_gb = disks
            .iter()
            .map(|d| d.available_space() / (1024 * 1024 * 1024))
            .max();

        match available_gb {
            Some(gb) if gb < 1 => HealthCheck {
                name,
                status: HealthStatus::Fail(format!("Less than 1GB available ({} GB)", gb)),
            },
            Some(gb) if gb < 3 => HealthCheck {
                name,
                status: HealthStatus::Warn(format!(
                    "Low disk space ({} GB available); model weights need ~0.5GB",
                    gb
                )),
            },
            Some(_) => HealthCheck {
                name,
                status: HealthStatus::Pass,
            },
            None => HealthCheck {
                name,
                status: HealthStatus::Warn("Could not determine disk space".to_string()),
            },
        }
    }

    /// Check 3: memory for inference
    fn check_memory(&self) -> HealthCheck {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let available_gb = sys.available_memory() / (1024 * 1024 * 1024);
        let name = "Memory".to_string();

        if available_gb < 1 {
            HealthCheck {
                name,
                status: HealthStatus::Fail(format!(
                    "Less than 1GB RAM available ({} GB)",
                    available_gb
                )),
            }
        } else if available_gb < 2 {
            HealthCheck {
                name,
                status: HealthStatus::Warn(format!("Low memory ({} GB available)", available_gb)),
            }
        } else {
            HealthCheck {
                name,
                status: HealthStatus::Pass,
            }
        }
    }

    /// Check 4: transcription service reachable
    async fn check_transcription_service(&self) -> HealthCheck {
        let name = "Transcription Service".to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        // Any HTTP response counts as reachable; the endpoint may well reject
        // a bodyless GET
        match client.get(&self.transcribe_url).send().await {
            Ok(_) => HealthCheck {
                name,
                status: HealthStatus::Pass,
            },
            Err(e) => HealthCheck {
                name,
                status: HealthStatus::Warn(format!(
                    "{} unreachable ({}); voice queries will fail",
                    self.transcribe_url, e
                )),
            },
        }
    }

    /// Check 5: default input device present
    fn check_input_device(&self) -> HealthCheck {
        use cpal::traits::HostTrait;
        let name = "Input Device".to_string();

        if cpal::default_host().default_input_device().is_some() {
            HealthCheck {
                name,
                status: HealthStatus::Pass,
            }
        } else {
            HealthCheck {
                name,
                status: HealthStatus::Warn(
                    "No default input device; voice queries will fail".to_string(),
                ),
            }
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\nhealthbuddy system diagnostics\n");
        println!("{:<24} {}", "Check", "Status");
        println!("{}", "=".repeat(56));

        for check in checks {
            let message = match &check.status {
                HealthStatus::Pass => "PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("{}: {}", "WARN".yellow(), msg),
                HealthStatus::Fail(msg) => format!("{}: {}", "FAIL".red(), msg),
            };
            println!("{:<24} {}", check.name, message);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctor_creation() {
        let doctor = Doctor::new(
            "deepset/bert-base-cased-squad2".to_string(),
            "http://localhost:9000/transcribe".to_string(),
        );
        assert_eq!(doctor.model_id, "deepset/bert-base-cased-squad2");
        assert_eq!(doctor.transcribe_url, "http://localhost:9000/transcribe");
    }

    #[test]
    fn test_overall_status_ignores_warnings() {
        let checks = vec![
            HealthCheck {
                name: "Test 1".to_string(),
                status: HealthStatus::Pass,
            },
            HealthCheck {
                name: "Test 2".to_string(),
                status: HealthStatus::Warn("warning".to_string()),
            },
        ];
        assert!(Doctor::overall_status(&checks));
    }

    #[test]
    fn test_overall_status_fails_on_fail() {
        let checks = vec![HealthCheck {
            name: "Test".to_string(),
            status: HealthStatus::Fail("error".to_string()),
        }];
        assert!(!Doctor::overall_status(&checks));
    }
}
