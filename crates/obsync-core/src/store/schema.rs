// ── Cell schemas ──
//
// Every value written to a state cell is checked against its schema
// first. A value that fails is never stored.

use crate::model::{Scene, Source, WebsocketConfig};

/// Validation rules for a cell's value type.
pub trait Schema {
    /// `Err` carries a human-readable reason.
    fn validate(&self) -> Result<(), String>;
}

impl Schema for WebsocketConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".into());
        }
        if self.port == 0 {
            return Err("port must be non-zero".into());
        }
        Ok(())
    }
}

impl Schema for Scene {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("scene name must not be empty".into());
        }
        self.sources.iter().try_for_each(Schema::validate)
    }
}

impl Schema for Source {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err(format!("source {} has an empty name", self.id));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!("source \"{}\" has invalid volume {}", self.name, self.volume));
        }
        self.group_children
            .iter()
            .flatten()
            .try_for_each(Schema::validate)
    }
}

impl<T: Schema> Schema for Option<T> {
    fn validate(&self) -> Result<(), String> {
        self.as_ref().map_or(Ok(()), Schema::validate)
    }
}

impl Schema for Vec<String> {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Schema for bool {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Size};

    fn source(name: &str, volume: f64) -> Source {
        Source {
            id: 7,
            name: name.into(),
            source_type: "color_source".into(),
            position: Position::default(),
            size: Size::default(),
            source_size: Size::default(),
            render: true,
            locked: false,
            volume,
            alignment: None,
            muted: None,
            parent_group_name: None,
            group_children: None,
        }
    }

    #[test]
    fn websocket_requires_host_and_port() {
        assert!(WebsocketConfig::default().validate().is_ok());
        let no_host = WebsocketConfig {
            host: "  ".into(),
            ..WebsocketConfig::default()
        };
        assert!(no_host.validate().is_err());
        let no_port = WebsocketConfig {
            port: 0,
            ..WebsocketConfig::default()
        };
        assert!(no_port.validate().is_err());
    }

    #[test]
    fn scene_checks_nested_sources() {
        let mut group = source("Group", 1.0);
        group.group_children = Some(vec![source("", 1.0)]);
        let scene = Scene::new("Main", vec![group]);
        assert!(scene.validate().is_err());

        let ok = Scene::new("Main", vec![source("Cam", 0.5)]);
        assert!(ok.validate().is_ok());
        assert!(Some(ok).validate().is_ok());
        assert!(None::<Scene>.validate().is_ok());
    }

    #[test]
    fn volume_must_be_finite_and_non_negative() {
        assert!(source("Mic", f64::NAN).validate().is_err());
        assert!(source("Mic", -0.1).validate().is_err());
        assert!(source("Mic", 0.0).validate().is_ok());
    }
}
