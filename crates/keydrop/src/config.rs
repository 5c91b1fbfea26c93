#![forbid(unsafe_code)]

//! Backend configuration.
//!
//! [`KeyboardBackendConfig`] carries plain settings and can be read from
//! the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `KEYDROP_PREVIEW` | render a drag preview (bool) | `true` |
//! | `KEYDROP_PREVIEW_CLASS` | container class, replaces default styling | unset |
//! | `KEYDROP_PREVIEW_OFFSET` | preview offset from drag position, `x,y` px | `30,15` |
//! | `KEYDROP_WRAP` | wrap navigation at the ends (bool) | `false` |
//! | `KEYDROP_ANNOUNCE_QUEUE` | owned live-region capacity | `8` |
//!
//! [`KeyboardBackendOptions`] adds the pluggable services on top.

use std::env;
use std::fmt;

use keydrop_core::Point;
use serde::{Deserialize, Serialize};

use crate::announcer::{LiveRegion, SharedAnnouncer};
use crate::messages::AnnouncementMessages;
use crate::preview::DomDragPreviewer;
use crate::trigger::DragTrigger;

const ENV_PREVIEW: &str = "KEYDROP_PREVIEW";
const ENV_PREVIEW_CLASS: &str = "KEYDROP_PREVIEW_CLASS";
const ENV_PREVIEW_OFFSET: &str = "KEYDROP_PREVIEW_OFFSET";
const ENV_WRAP: &str = "KEYDROP_WRAP";
const ENV_ANNOUNCE_QUEUE: &str = "KEYDROP_ANNOUNCE_QUEUE";

// ---------------------------------------------------------------------------
// KeyboardBackendConfig
// ---------------------------------------------------------------------------

/// Plain-data backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardBackendConfig {
    /// Render a drag preview overlay.
    pub preview: bool,
    /// Container class for the preview overlay.
    pub previewer_class_name: Option<String>,
    /// Preview position relative to the drag position.
    pub preview_offset: Point,
    /// Wrap navigation from the last target to the first and back.
    pub wrap_navigation: bool,
    /// Capacity of the owned live region.
    pub announcement_queue: usize,
}

impl Default for KeyboardBackendConfig {
    fn default() -> Self {
        Self {
            preview: true,
            previewer_class_name: None,
            preview_offset: DomDragPreviewer::DEFAULT_OFFSET,
            wrap_navigation: false,
            announcement_queue: LiveRegion::DEFAULT_CAPACITY,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct KeyboardBackendConfigParse {
    pub config: KeyboardBackendConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl KeyboardBackendConfig {
    /// Parse config from environment variables, ignoring diagnostics.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> KeyboardBackendConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config from an arbitrary variable source.
    pub fn from_env_with<F>(mut get: F) -> KeyboardBackendConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_PREVIEW) {
            match parse_bool(&value) {
                Some(parsed) => config.preview = parsed,
                None => errors.push(ConfigError::new(
                    "preview",
                    value,
                    "expected bool (1/0/true/false)",
                )),
            }
        }

        if let Some(value) = get(ENV_PREVIEW_CLASS) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                config.previewer_class_name = Some(trimmed.to_owned());
            }
        }

        if let Some(value) = get(ENV_PREVIEW_OFFSET) {
            match parse_point(&value) {
                Some(parsed) => config.preview_offset = parsed,
                None => errors.push(ConfigError::new(
                    "preview_offset",
                    value,
                    "expected x,y in px",
                )),
            }
        }

        if let Some(value) = get(ENV_WRAP) {
            match parse_bool(&value) {
                Some(parsed) => config.wrap_navigation = parsed,
                None => errors.push(ConfigError::new(
                    "wrap_navigation",
                    value,
                    "expected bool (1/0/true/false)",
                )),
            }
        }

        if let Some(value) = get(ENV_ANNOUNCE_QUEUE) {
            match value.trim().parse::<usize>() {
                Ok(parsed) => config.announcement_queue = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "announcement_queue",
                    value,
                    "expected unsigned integer",
                )),
            }
        }

        if let Err(mut invalid) = config.validate() {
            errors.append(&mut invalid);
        }

        KeyboardBackendConfigParse { config, errors }
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.announcement_queue == 0 {
            errors.push(ConfigError::new(
                "announcement_queue",
                "0",
                "must be greater than zero",
            ));
        }
        if !self.preview_offset.x.is_finite() || !self.preview_offset.y.is_finite() {
            errors.push(ConfigError::new(
                "preview_offset",
                format!("{},{}", self.preview_offset.x, self.preview_offset.y),
                "must be finite",
            ));
        }
        if self
            .previewer_class_name
            .as_deref()
            .is_some_and(|name| name.chars().any(char::is_whitespace))
        {
            errors.push(ConfigError::new(
                "previewer_class_name",
                self.previewer_class_name.clone().unwrap_or_default(),
                "must be a single class name",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_point(value: &str) -> Option<Point> {
    let (x, y) = value.split_once(',')?;
    let x = x.trim().parse::<f64>().ok()?;
    let y = y.trim().parse::<f64>().ok()?;
    Some(Point::new(x, y))
}

// ---------------------------------------------------------------------------
// KeyboardBackendOptions
// ---------------------------------------------------------------------------

type ModeChanged = Box<dyn FnMut(bool)>;

/// Options bag passed to the backend factory.
#[derive(Default)]
pub struct KeyboardBackendOptions {
    pub(crate) config: KeyboardBackendConfig,
    pub(crate) on_dnd_mode_changed: Option<ModeChanged>,
    pub(crate) drag_trigger: Option<Box<dyn DragTrigger>>,
    pub(crate) announcement_messages: Option<Box<dyn AnnouncementMessages>>,
    pub(crate) announcer: Option<SharedAnnouncer>,
}

impl fmt::Debug for KeyboardBackendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardBackendOptions")
            .field("config", &self.config)
            .field("on_dnd_mode_changed", &self.on_dnd_mode_changed.is_some())
            .field("drag_trigger", &self.drag_trigger.is_some())
            .field("announcement_messages", &self.announcement_messages.is_some())
            .field("announcer", &self.announcer.is_some())
            .finish()
    }
}

impl KeyboardBackendOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: KeyboardBackendConfig) -> Self {
        self.config = config;
        self
    }

    /// Called with `true` when a gesture starts and `false` when it ends.
    #[must_use]
    pub fn on_dnd_mode_changed(mut self, callback: impl FnMut(bool) + 'static) -> Self {
        self.on_dnd_mode_changed = Some(Box::new(callback));
        self
    }

    /// Replace the start-trigger predicate.
    #[must_use]
    pub fn with_drag_trigger(mut self, trigger: impl DragTrigger + 'static) -> Self {
        self.drag_trigger = Some(Box::new(trigger));
        self
    }

    #[must_use]
    pub fn with_announcement_messages(
        mut self,
        messages: impl AnnouncementMessages + 'static,
    ) -> Self {
        self.announcement_messages = Some(Box::new(messages));
        self
    }

    /// Use an integrator-owned announcer. The backend never destroys it.
    #[must_use]
    pub fn with_announcer(mut self, announcer: SharedAnnouncer) -> Self {
        self.announcer = Some(announcer);
        self
    }

    #[must_use]
    pub fn with_previewer_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.config.previewer_class_name = Some(class_name.into());
        self
    }

    #[must_use]
    pub fn with_preview(mut self, enabled: bool) -> Self {
        self.config.preview = enabled;
        self
    }

    #[must_use]
    pub fn with_wrap_navigation(mut self, wrap: bool) -> Self {
        self.config.wrap_navigation = wrap;
        self
    }

    #[must_use]
    pub fn config(&self) -> &KeyboardBackendConfig {
        &self.config
    }
}
