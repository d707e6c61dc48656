// ── Wire-to-domain conversions ──
//
// Bridges raw `obsync_api::models` reply types into `obsync_core::model`
// domain types. Replies that lack the fields a scene needs convert to
// `None` rather than to an empty scene.

use obsync_api::models::{
    NamedItem, PreviewSceneChangedEvent, SceneItem, SceneListReply, SceneReply, SourcesListReply,
};

use crate::model::{Position, Scene, Size, Source};

// ── Sources ────────────────────────────────────────────────────────

impl From<SceneItem> for Source {
    fn from(item: SceneItem) -> Self {
        Source {
            id: item.id,
            name: item.name,
            source_type: item.item_type,
            position: Position {
                x: item.x,
                y: item.y,
            },
            size: Size {
                cx: item.cx,
                cy: item.cy,
            },
            source_size: Size {
                cx: item.source_cx,
                cy: item.source_cy,
            },
            render: item.render,
            locked: item.locked,
            volume: item.volume,
            alignment: item.alignment,
            muted: item.muted,
            parent_group_name: item.parent_group_name,
            group_children: item
                .group_children
                .map(|children| children.into_iter().map(Source::from).collect()),
        }
    }
}

// ── Scenes ─────────────────────────────────────────────────────────

/// Convert a `GetCurrentScene` / `GetPreviewScene` reply.
///
/// Returns `None` when the reply is missing its name or sources, or the
/// name is empty. Some server builds answer that way and it must not
/// clear the cell.
pub fn scene_from_reply(reply: SceneReply) -> Option<Scene> {
    let (Some(name), Some(sources)) = (reply.name, reply.sources) else {
        return None;
    };
    if name.is_empty() {
        return None;
    }
    Some(Scene::new(
        name,
        sources.into_iter().map(Source::from).collect(),
    ))
}

impl From<PreviewSceneChangedEvent> for Scene {
    fn from(event: PreviewSceneChangedEvent) -> Self {
        Scene::new(
            event.scene_name,
            event.sources.into_iter().map(Source::from).collect(),
        )
    }
}

// ── Name lists ─────────────────────────────────────────────────────

fn names(items: Vec<NamedItem>) -> Vec<String> {
    items.into_iter().map(|item| item.name).collect()
}

pub fn scene_names(reply: SceneListReply) -> Vec<String> {
    names(reply.scenes)
}

pub fn source_names(reply: SourcesListReply) -> Vec<String> {
    names(reply.sources)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(name: &str) -> SceneItem {
        serde_json::from_value(json!({
            "id": 1, "name": name, "type": "image_source",
            "x": 5, "y": 6, "cx": 100, "cy": 50,
            "source_cx": 200, "source_cy": 100,
            "render": true, "locked": false, "volume": 0.75,
            "alignment": 5, "muted": false
        }))
        .unwrap()
    }

    #[test]
    fn scene_item_maps_to_source() {
        let source = Source::from(item("Logo"));
        assert_eq!(source.name, "Logo");
        assert_eq!(source.source_type, "image_source");
        assert_eq!(source.position, Position { x: 5.0, y: 6.0 });
        assert_eq!(source.source_size, Size { cx: 200.0, cy: 100.0 });
        assert_eq!(source.alignment, Some(5));
        assert!(source.group_children.is_none());
    }

    #[test]
    fn complete_reply_becomes_scene() {
        let reply = SceneReply {
            name: Some("Live".into()),
            sources: Some(vec![item("Cam")]),
        };
        let scene = scene_from_reply(reply).unwrap();
        assert_eq!(scene.name, "Live");
        assert!(scene.source("Cam").is_some());
    }

    #[test]
    fn incomplete_reply_is_no_update() {
        assert!(scene_from_reply(SceneReply::default()).is_none());
        assert!(
            scene_from_reply(SceneReply {
                name: Some("Live".into()),
                sources: None,
            })
            .is_none()
        );
        assert!(
            scene_from_reply(SceneReply {
                name: Some(String::new()),
                sources: Some(Vec::new()),
            })
            .is_none()
        );
    }

    #[test]
    fn empty_source_list_is_still_a_scene() {
        let scene = scene_from_reply(SceneReply {
            name: Some("Blank".into()),
            sources: Some(Vec::new()),
        })
        .unwrap();
        assert!(scene.sources.is_empty());
    }
}
