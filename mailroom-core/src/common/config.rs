/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Configuration for the Mailroom library.
///
/// Contains all configurable values, loaded from TOML files in
/// XDG-compliant directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct MailroomConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Limits and capacity configuration
    pub limits: LimitsConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Default `post_and_reply` timeout in milliseconds; `0` means wait
    /// without a deadline.
    pub default_reply_timeout_ms: u64,
    /// Grace period in milliseconds that `dispose()` waits for the worker
    /// before giving up.
    pub dispose_grace_ms: u64,
}

/// Limits and capacity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Default mailbox capacity; `0` means unbounded.
    pub mailbox_capacity: usize,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_reply_timeout_ms: 0,
            dispose_grace_ms: 10_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 0,
        }
    }
}

impl MailroomConfig {
    /// The default `post_and_reply` timeout, `None` when unset.
    pub fn default_reply_timeout(&self) -> Option<Duration> {
        match self.timeouts.default_reply_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// The grace period `dispose()` grants the worker task.
    pub const fn dispose_grace(&self) -> Duration {
        Duration::from_millis(self.timeouts.dispose_grace_ms)
    }

    /// The default mailbox capacity, `None` when unbounded.
    pub fn default_mailbox_capacity(&self) -> Option<usize> {
        match self.limits.mailbox_capacity {
            0 => None,
            capacity => Some(capacity),
        }
    }

    /// Load configuration from XDG-compliant locations.
    ///
    /// Attempts to load `mailroom/config.toml` from the XDG config
    /// directories. If no configuration file is found, returns the default
    /// configuration. If a configuration file exists but is malformed, logs
    /// an error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("mailroom") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let config_path = xdg_dirs.find_config_file("config.toml");

        if let Some(path) = config_path {
            info!("Loading configuration from: {}", path.display());
            match std::fs::read_to_string(&path) {
                Ok(config_str) => match toml::from_str::<Self>(&config_str) {
                    Ok(config) => config,
                    Err(e) => {
                        error!(
                            "Failed to parse configuration file {}: {}",
                            path.display(),
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    error!(
                        "Failed to read configuration file {}: {}",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            }
        } else {
            info!("No configuration file found, using defaults");
            Self::default()
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: MailroomConfig = MailroomConfig::load();
}
