use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    LeftRight,
    TopDown,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LR" | "lr" => Some(Self::LeftRight),
            "TD" | "TB" | "td" | "tb" => Some(Self::TopDown),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight)
    }
}

/// Where nodes of one rank line up along the rank axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankAlign {
    #[default]
    Start,
    Center,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub direction: Direction,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub component_spacing: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub align: RankAlign,
    pub order_passes: usize,
    pub settle_timeout_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: Direction::LeftRight,
            node_spacing: 40.0,
            rank_spacing: 80.0,
            margin_x: 20.0,
            margin_y: 20.0,
            component_spacing: 80.0,
            origin_x: 100.0,
            origin_y: 100.0,
            align: RankAlign::Start,
            order_passes: 4,
            settle_timeout_ms: 50,
        }
    }
}

impl LayoutConfig {
    /// Raises spacings below the overlap margins so a layout run can never
    /// produce boxes the overlap tester would reject.
    pub fn normalized(mut self) -> Self {
        self.margin_x = sanitize(self.margin_x, 0.0);
        self.margin_y = sanitize(self.margin_y, 0.0);
        let (along_rank, across_rank) = if self.direction.is_horizontal() {
            (self.margin_y, self.margin_x)
        } else {
            (self.margin_x, self.margin_y)
        };
        self.node_spacing = sanitize(self.node_spacing, along_rank).max(along_rank);
        self.rank_spacing = sanitize(self.rank_spacing, across_rank).max(across_rank);
        let widest = self.margin_x.max(self.margin_y);
        self.component_spacing = sanitize(self.component_spacing, widest).max(widest);
        self.order_passes = self.order_passes.max(1);
        self
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

pub(crate) fn sanitize(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

/// Content-length footprint estimate used before a node has been rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeasureConfig {
    pub char_width: f32,
    pub line_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub header_height: f32,
    pub choice_row_height: f32,
    pub min_width: f32,
    pub max_width: f32,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            char_width: 7.5,
            line_height: 20.0,
            padding_x: 24.0,
            padding_y: 16.0,
            header_height: 28.0,
            choice_row_height: 26.0,
            min_width: 160.0,
            max_width: 320.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacementConfig {
    pub origin_x: f32,
    pub origin_y: f32,
    pub spacing_x: f32,
    pub spacing_y: f32,
    pub choice_gap: f32,
    pub max_rows: usize,
    pub max_attempts: usize,
    pub fallback_width: f32,
    pub fallback_height: f32,
    pub seed: u64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            origin_x: 100.0,
            origin_y: 100.0,
            spacing_x: 60.0,
            spacing_y: 30.0,
            choice_gap: 20.0,
            max_rows: 8,
            max_attempts: 64,
            fallback_width: 600.0,
            fallback_height: 400.0,
            seed: 0x5eed,
        }
    }
}

impl PlacementConfig {
    /// Replaces non-finite or negative distances with the defaults, so the
    /// candidate grid and the random fallback region stay finite.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !self.origin_x.is_finite() {
            self.origin_x = defaults.origin_x;
        }
        if !self.origin_y.is_finite() {
            self.origin_y = defaults.origin_y;
        }
        self.spacing_x = sanitize(self.spacing_x, defaults.spacing_x);
        self.spacing_y = sanitize(self.spacing_y, defaults.spacing_y);
        self.choice_gap = sanitize(self.choice_gap, defaults.choice_gap);
        self.fallback_width = sanitize(self.fallback_width, defaults.fallback_width);
        self.fallback_height = sanitize(self.fallback_height, defaults.fallback_height);
        self.max_rows = self.max_rows.max(1);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub measure: MeasureConfig,
    pub placement: PlacementConfig,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Accepts strict JSON first, then JSON5 for hand-edited files.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config: Config = match serde_json::from_str(contents) {
        Ok(config) => config,
        Err(json_err) => json5::from_str(contents)
            .map_err(|json5_err| anyhow::anyhow!("invalid config: {json_err}; {json5_err}"))?,
    };
    config.layout = config.layout.normalized();
    config.placement = config.placement.normalized();
    Ok(config)
}
