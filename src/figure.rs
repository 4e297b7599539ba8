//! Renderer-agnostic plot descriptions.
//!
//! The shape follows the figure JSON understood by web plotting front ends
//! (`{"data": [...traces], "layout": {...}}`), so a web caller can hand
//! [`Figure::to_json`] straight to its plotting library while the desktop
//! viewer draws the same values with `egui_plot`.

use serde::Serialize;

use crate::color::ColorScale;

/// Width × height of the placeholder spectrum plot.
pub const EMPTY_SPECTRUM_SIZE: (u32, u32) = (1300, 700);
/// Width × height of the placeholder heatmap.
pub const EMPTY_HEATMAP_SIZE: (u32, u32) = (800, 800);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    /// Line series.
    Scatter {
        x: Vec<f64>,
        y: Vec<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        marker_color: Option<String>,
    },
    /// Scattered `(x, y)` cells coloured by `z`.
    Heatmap {
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        colorscale: Option<ColorScale>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Figure {
    /// Placeholder returned when there is nothing to plot yet.
    pub fn empty_spectrum() -> Self {
        let (width, height) = EMPTY_SPECTRUM_SIZE;
        Figure {
            data: vec![Trace::Scatter {
                x: Vec::new(),
                y: Vec::new(),
                marker_color: None,
            }],
            layout: Layout {
                title: None,
                width: Some(width),
                height: Some(height),
            },
        }
    }

    /// Placeholder returned when there is no heatmap to show.
    pub fn empty_heatmap() -> Self {
        let (width, height) = EMPTY_HEATMAP_SIZE;
        Figure {
            data: vec![Trace::Heatmap {
                x: Vec::new(),
                y: Vec::new(),
                z: Vec::new(),
                colorscale: None,
            }],
            layout: Layout {
                title: None,
                width: Some(width),
                height: Some(height),
            },
        }
    }

    /// True when no trace carries any point.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|trace| match trace {
            Trace::Scatter { x, .. } | Trace::Heatmap { x, .. } => x.is_empty(),
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.layout.title.as_deref()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_figures() {
        let spectrum = Figure::empty_spectrum();
        assert!(spectrum.is_empty());
        assert_eq!(spectrum.layout.width, Some(1300));
        assert_eq!(spectrum.layout.height, Some(700));

        let heatmap = Figure::empty_heatmap();
        assert!(heatmap.is_empty());
        assert_eq!((heatmap.layout.width, heatmap.layout.height), (Some(800), Some(800)));
    }

    #[test]
    fn test_json_shape() {
        let fig = Figure {
            data: vec![Trace::Heatmap {
                x: vec![0.0],
                y: vec![5.0],
                z: vec![12.5],
                colorscale: Some(ColorScale::Jet),
            }],
            layout: Layout {
                title: Some("t".into()),
                ..Default::default()
            },
        };
        let json: serde_json::Value = serde_json::from_str(&fig.to_json().unwrap()).unwrap();
        assert_eq!(json["data"][0]["type"], "heatmap");
        assert_eq!(json["data"][0]["colorscale"], "Jet");
        assert_eq!(json["data"][0]["z"][0], 12.5);
        assert_eq!(json["layout"]["title"], "t");
        assert!(json["layout"].get("width").is_none());
    }
}
