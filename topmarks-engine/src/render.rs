use topmarks_core::geometry::GeoBounds;
use topmarks_core::model::FolderTree;

use crate::visibility::VisibilityState;

const FALLBACK_COLOR: &str = "#1976d2";

/// 渲染参数，由前端从配置转换而来。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub default_center: (f64, f64),
    pub zoom: u8,
    pub palette: Vec<String>,
    pub marker_radius_m: f64,
}

impl RenderStyle {
    /// 按可见图层的顺序循环分配调色板颜色。
    pub fn color_for(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            FALLBACK_COLOR
        } else {
            &self.palette[index % self.palette.len()]
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            default_center: (-38.1, 144.8),
            zoom: 10,
            palette: vec![FALLBACK_COLOR.to_string()],
            marker_radius_m: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderMark {
    pub folder_id: String,
    pub layer_id: String,
    pub label: String,
    /// 名称与六位小数坐标，两行。
    pub popup: String,
    pub lat: f64,
    pub lng: f64,
    pub color: String,
    pub radius_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerColor {
    pub layer_id: String,
    pub color: String,
}

/// 交给地图端的最终视图。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub marks: Vec<RenderMark>,
    pub layer_colors: Vec<LayerColor>,
}

impl RenderView {
    pub fn build(tree: &FolderTree, visibility: &VisibilityState, style: &RenderStyle) -> Self {
        let mut marks = Vec::new();
        let mut layer_colors = Vec::new();
        let mut bounds = GeoBounds::empty();

        let visible_layers = visibility
            .visible_layers(tree)
            .into_iter()
            .flat_map(|(folder, layers)| layers.into_iter().map(move |layer| (folder, layer)));

        for (index, (folder, layer)) in visible_layers.enumerate() {
            let color = style.color_for(index).to_string();
            bounds.include_bounds(&layer.bounds());
            for mark in &layer.marks {
                marks.push(RenderMark {
                    folder_id: folder.id.clone(),
                    layer_id: layer.id.clone(),
                    label: mark.name.clone(),
                    popup: format!("{}\n{:.6}, {:.6}", mark.name, mark.lat, mark.lng),
                    lat: mark.lat,
                    lng: mark.lng,
                    color: color.clone(),
                    radius_m: style.marker_radius_m,
                });
            }
            layer_colors.push(LayerColor {
                layer_id: layer.id.clone(),
                color,
            });
        }

        Self {
            center: bounds.center().unwrap_or(style.default_center),
            zoom: style.zoom,
            marks,
            layer_colors,
        }
    }
}

#[cfg(test)]
mod tests {
    use topmarks_core::geometry::GeoPoint;
    use topmarks_core::model::{Folder, Layer};

    use super::*;

    fn tree() -> FolderTree {
        FolderTree::new()
            .add_folder(Folder::with_id("a", "A"))
            .add_folder(Folder::with_id("b", "B"))
            .add_layer(
                "a",
                Layer::with_id("a1", "A1", vec![GeoPoint::new("Reef Marker", -38.10205, 144.8076)]),
            )
            .add_layer(
                "a",
                Layer::with_id(
                    "a2",
                    "A2",
                    vec![
                        GeoPoint::new("North", -38.0, 144.0),
                        GeoPoint::new("South", -39.0, 145.0),
                    ],
                ),
            )
            .add_layer("b", Layer::with_id("b1", "B1", vec![GeoPoint::new("Buoy", -37.0, 146.0)]))
    }

    fn style() -> RenderStyle {
        RenderStyle {
            palette: vec!["red".into(), "green".into()],
            ..RenderStyle::default()
        }
    }

    #[test]
    fn colors_cycle_over_visible_layers() {
        let tree = tree();
        let mut visibility = VisibilityState::new();
        visibility.reconcile(&tree);

        let view = RenderView::build(&tree, &visibility, &style());
        let colors: Vec<_> = view
            .layer_colors
            .iter()
            .map(|c| (c.layer_id.as_str(), c.color.as_str()))
            .collect();
        assert_eq!(colors, vec![("a1", "red"), ("a2", "green"), ("b1", "red")]);
        assert_eq!(view.marks.len(), 4);
        assert_eq!(view.marks[0].popup, "Reef Marker\n-38.102050, 144.807600");
        assert!((view.marks[0].radius_m - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hidden_folder_removes_its_marks_and_recenters() {
        let tree = tree();
        let mut visibility = VisibilityState::new();
        visibility.reconcile(&tree);
        visibility.toggle_folder("a");

        let view = RenderView::build(&tree, &visibility, &style());
        assert_eq!(view.marks.len(), 1);
        assert_eq!(view.marks[0].layer_id, "b1");
        assert_eq!(view.marks[0].color, "red");
        assert_eq!(view.center, (-37.0, 146.0));
    }

    #[test]
    fn empty_view_uses_default_center() {
        let tree = FolderTree::with_default();
        let mut visibility = VisibilityState::new();
        visibility.reconcile(&tree);

        let view = RenderView::build(&tree, &visibility, &RenderStyle::default());
        assert!(view.marks.is_empty());
        assert_eq!(view.center, (-38.1, 144.8));
        assert_eq!(view.zoom, 10);
    }

    #[test]
    fn empty_palette_falls_back() {
        let style = RenderStyle {
            palette: Vec::new(),
            ..RenderStyle::default()
        };
        assert_eq!(style.color_for(3), "#1976d2");
    }
}
