use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::bail;

/// Location of the hand tracking CPU graph, relative to the resource directory.
pub const HAND_TRACKING_GRAPH: &str =
    "mediapipe/modules/hand_landmark/hand_landmark_tracking_cpu.binarypb";

/// Name of the input stream of the hand tracking graph.
pub const HAND_TRACKING_INPUT: &str = "image";

/// Value of a calculator node option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue {
    Float(f32),
    Double(f64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v} (float)"),
            Self::Double(v) => write!(f, "{v} (double)"),
        }
    }
}

/// Overrides an option of a single calculator node in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOption {
    pub node: String,
    pub option: String,
    pub value: OptionValue,
}

/// Initial value of a graph input side packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SidePacket {
    Int(i32),
    Bool(bool),
    Float(f32),
}

impl fmt::Display for SidePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v} (int)"),
            Self::Bool(v) => write!(f, "{v} (bool)"),
            Self::Float(v) => write!(f, "{v} (float)"),
        }
    }
}

/// Everything needed to instantiate and start a graph.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    resource_dir: PathBuf,
    graph: PathBuf,
    input_stream: String,
    options: Vec<NodeOption>,
    side_packets: Vec<(String, SidePacket)>,
}

impl GraphConfig {
    /// Creates a configuration for the binary graph at `graph`.
    ///
    /// `graph` is interpreted relative to `resource_dir`, which is also where the engine will look
    /// for model files.
    pub fn new(
        resource_dir: impl Into<PathBuf>,
        graph: impl Into<PathBuf>,
        input_stream: impl Into<String>,
    ) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            graph: graph.into(),
            input_stream: input_stream.into(),
            options: Vec::new(),
            side_packets: Vec::new(),
        }
    }

    /// Creates the configuration of the hand tracking CPU graph shipped in `resource_dir`.
    pub fn hand_tracking(resource_dir: impl Into<PathBuf>, opts: &HandTrackingOptions) -> Self {
        Self::new(resource_dir, HAND_TRACKING_GRAPH, HAND_TRACKING_INPUT)
            .option(
                "palmdetectioncpu__TensorsToDetectionsCalculator",
                "min_score_thresh",
                OptionValue::Float(opts.min_detection_score),
            )
            .option(
                "handlandmarkcpu__ThresholdingCalculator",
                "threshold",
                OptionValue::Double(opts.landmark_threshold),
            )
            .side_packet("num_hands", SidePacket::Int(opts.num_hands))
            .side_packet("model_complexity", SidePacket::Int(opts.model_complexity))
            .side_packet(
                "use_prev_landmarks",
                SidePacket::Bool(opts.use_prev_landmarks),
            )
    }

    /// Adds a calculator node option override.
    pub fn option(
        mut self,
        node: impl Into<String>,
        option: impl Into<String>,
        value: OptionValue,
    ) -> Self {
        self.options.push(NodeOption {
            node: node.into(),
            option: option.into(),
            value,
        });
        self
    }

    /// Adds an input side packet.
    pub fn side_packet(mut self, name: impl Into<String>, value: SidePacket) -> Self {
        self.side_packets.push((name.into(), value));
        self
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// Returns the full path to the binary graph file.
    pub fn graph_path(&self) -> PathBuf {
        self.resource_dir.join(&self.graph)
    }

    pub fn input_stream(&self) -> &str {
        &self.input_stream
    }

    pub fn options(&self) -> &[NodeOption] {
        &self.options
    }

    pub fn side_packets(&self) -> &[(String, SidePacket)] {
        &self.side_packets
    }

    /// Checks that the resource directory and the graph file exist, and that all names can be
    /// passed to C (no NUL bytes).
    ///
    /// Engines call this before loading anything, so that a wrong path is reported by name.
    pub fn check(&self) -> anyhow::Result<()> {
        let names = [self.input_stream.as_str()]
            .into_iter()
            .chain(
                self.options
                    .iter()
                    .flat_map(|opt| [opt.node.as_str(), opt.option.as_str()]),
            )
            .chain(self.side_packets.iter().map(|(name, _)| name.as_str()));
        for name in names {
            if name.contains('\0') {
                bail!("graph parameter name {name:?} contains a NUL byte");
            }
        }

        if !self.resource_dir.is_dir() {
            bail!(
                "resource directory '{}' does not exist or is not a directory",
                self.resource_dir.display()
            );
        }
        let graph = self.graph_path();
        if !graph.is_file() {
            bail!("graph file '{}' not found", graph.display());
        }
        Ok(())
    }
}

/// Tunable parameters of the hand tracking graph.
///
/// The defaults match the ones the graph itself uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandTrackingOptions {
    num_hands: i32,
    model_complexity: i32,
    min_detection_score: f32,
    landmark_threshold: f64,
    use_prev_landmarks: bool,
}

impl Default for HandTrackingOptions {
    fn default() -> Self {
        Self {
            num_hands: 2,
            model_complexity: 1,
            min_detection_score: 0.6,
            landmark_threshold: 0.2,
            use_prev_landmarks: true,
        }
    }
}

impl HandTrackingOptions {
    /// Sets the maximum number of hands to track.
    #[inline]
    pub fn num_hands(mut self, num_hands: i32) -> Self {
        self.num_hands = num_hands;
        self
    }

    /// Selects the landmark model: 0 is the lite model, 1 the full one.
    #[inline]
    pub fn model_complexity(mut self, model_complexity: i32) -> Self {
        self.model_complexity = model_complexity;
        self
    }

    /// Sets the minimum confidence score for palm detections.
    #[inline]
    pub fn min_detection_score(mut self, score: f32) -> Self {
        self.min_detection_score = score;
        self
    }

    /// Sets the hand presence threshold below which landmarks are discarded.
    #[inline]
    pub fn landmark_threshold(mut self, threshold: f64) -> Self {
        self.landmark_threshold = threshold;
        self
    }

    /// Sets whether landmarks of the previous frame are used to locate hands in the next one,
    /// instead of running palm detection on every frame.
    #[inline]
    pub fn use_prev_landmarks(mut self, use_prev_landmarks: bool) -> Self {
        self.use_prev_landmarks = use_prev_landmarks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_tracking_defaults() {
        let config = GraphConfig::hand_tracking("res", &HandTrackingOptions::default());

        assert_eq!(
            config.graph_path(),
            Path::new("res").join(HAND_TRACKING_GRAPH)
        );
        assert_eq!(config.input_stream(), "image");
        assert_eq!(
            config.options(),
            [
                NodeOption {
                    node: "palmdetectioncpu__TensorsToDetectionsCalculator".into(),
                    option: "min_score_thresh".into(),
                    value: OptionValue::Float(0.6),
                },
                NodeOption {
                    node: "handlandmarkcpu__ThresholdingCalculator".into(),
                    option: "threshold".into(),
                    value: OptionValue::Double(0.2),
                },
            ]
        );
        assert_eq!(
            config.side_packets(),
            [
                ("num_hands".to_string(), SidePacket::Int(2)),
                ("model_complexity".to_string(), SidePacket::Int(1)),
                ("use_prev_landmarks".to_string(), SidePacket::Bool(true)),
            ]
        );
    }

    #[test]
    fn hand_tracking_overrides() {
        let opts = HandTrackingOptions::default()
            .num_hands(1)
            .model_complexity(0)
            .use_prev_landmarks(false);
        let config = GraphConfig::hand_tracking("res", &opts);

        assert_eq!(config.side_packets()[0].1, SidePacket::Int(1));
        assert_eq!(config.side_packets()[1].1, SidePacket::Int(0));
        assert_eq!(config.side_packets()[2].1, SidePacket::Bool(false));
    }

    #[test]
    fn check_missing_resource_dir() {
        let config = GraphConfig::hand_tracking(
            "/this/path/does/not/exist",
            &HandTrackingOptions::default(),
        );
        let err = config.check().unwrap_err().to_string();
        assert!(err.contains("resource directory"), "{err}");
    }

    #[test]
    fn check_missing_graph() {
        let config = GraphConfig::hand_tracking(
            env!("CARGO_MANIFEST_DIR"),
            &HandTrackingOptions::default(),
        );
        let err = config.check().unwrap_err().to_string();
        assert!(err.contains("graph file"), "{err}");
    }

    #[test]
    fn check_nul_bytes() {
        let base = || GraphConfig::new(env!("CARGO_MANIFEST_DIR"), "Cargo.toml", "in");

        let err = GraphConfig::new(env!("CARGO_MANIFEST_DIR"), "Cargo.toml", "in\0put")
            .check()
            .unwrap_err()
            .to_string();
        assert!(err.contains("NUL"), "{err}");
        assert!(base()
            .option("node", "opt\0", OptionValue::Float(1.0))
            .check()
            .is_err());
        assert!(base()
            .side_packet("num\0hands", SidePacket::Int(1))
            .check()
            .is_err());
        base()
            .option("node", "opt", OptionValue::Float(1.0))
            .side_packet("num_hands", SidePacket::Int(1))
            .check()
            .unwrap();
    }

    #[test]
    fn check_ok() {
        let config = GraphConfig::new(env!("CARGO_MANIFEST_DIR"), "Cargo.toml", "in");
        config.check().unwrap();
    }

    #[test]
    fn display_values() {
        assert_eq!(OptionValue::Double(0.5).to_string(), "0.5 (double)");
        assert_eq!(SidePacket::Bool(true).to_string(), "true (bool)");
    }
}
