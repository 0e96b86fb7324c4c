//! Registry of beams and joints and the resolution of joint features.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::beam::{Beam, BeamKey};
use crate::config::Settings;
use crate::errors::{AssemblyError, ClassificationError, JoiningError};
use crate::geometry::{Line, Point, Vector};
use crate::joints::{Joint, JointKey, JointKind, JointOptions, JointOutput, JointState};
use crate::topology::{classify, Classification};

/// Node of the connectivity graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Node {
    /// A beam of the assembly.
    Beam(BeamKey),
    /// A joint, connected to the two beams it joins.
    Joint(JointKey),
}

/// Outcome of resolving every joint of an assembly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolutionReport {
    /// Joints whose features were applied, in key order.
    pub resolved: Vec<JointKey>,
    /// Joints that failed; none of their features were applied.
    pub failures: Vec<JoiningError>,
}

impl ResolutionReport {
    /// Whether every joint resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Collection of beams connected by joints.
#[derive(Clone, Debug, Default)]
pub struct Assembly {
    /// Connectivity between beams and joints.
    graph: UnGraph<Node, ()>,
    /// Beams by key.
    beams: BTreeMap<BeamKey, Beam>,
    /// Joints by key.
    joints: BTreeMap<JointKey, Joint>,
    /// Graph node of every beam.
    beam_nodes: HashMap<BeamKey, NodeIndex>,
    /// Tolerances used for classification and joining.
    settings: Settings,
    /// Key handed to the next beam.
    next_beam: u32,
    /// Key handed to the next joint.
    next_joint: u32,
}

impl Assembly {
    /// Create an empty assembly.
    ///
    /// # Examples
    /// ```
    /// use timberjoin::{Assembly, Settings};
    ///
    /// let assembly = Assembly::new(Settings::default());
    /// assert_eq!(assembly.beam_count(), 0);
    /// ```
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Settings used by this assembly.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of beams.
    #[must_use]
    pub fn beam_count(&self) -> usize {
        self.beams.len()
    }

    /// Number of joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Add a beam along `centerline` with the given cross-section.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidCrossSection`] for a non-positive width or height and
    /// [`AssemblyError::Geometry`] for a zero-length centerline.
    ///
    /// # Examples
    /// ```
    /// use timberjoin::{point, Assembly, Line, Settings};
    ///
    /// let mut assembly = Assembly::new(Settings::default());
    /// let beam = assembly
    ///     .add_beam(Line::new(point(0.0, 0.0, 0.0), point(1000.0, 0.0, 0.0)), 100.0, 200.0, None)
    ///     .expect("valid beam");
    /// assert_eq!(assembly.find_by_key(beam).expect("beam exists").height(), 200.0);
    /// ```
    pub fn add_beam(
        &mut self,
        centerline: Line,
        width: f64,
        height: f64,
        z_vector: Option<Vector>,
    ) -> Result<BeamKey, AssemblyError> {
        let key = BeamKey(self.next_beam);
        self.insert_beam(key, centerline, width, height, z_vector)?;
        Ok(key)
    }

    /// Add a beam under a caller-chosen key.
    fn insert_beam(
        &mut self,
        key: BeamKey,
        centerline: Line,
        width: f64,
        height: f64,
        z_vector: Option<Vector>,
    ) -> Result<(), AssemblyError> {
        if self.beams.contains_key(&key) {
            return Err(AssemblyError::DuplicateBeam(key));
        }
        if !(width > 0.0 && height > 0.0) {
            return Err(AssemblyError::InvalidCrossSection { width, height });
        }
        let beam = Beam::from_centerline(key, centerline, width, height, z_vector)?;
        let node = self.graph.add_node(Node::Beam(key));
        self.beam_nodes.insert(key, node);
        self.beams.insert(key, beam);
        self.next_beam = self.next_beam.max(key.0 + 1);
        debug!(beam = %key, width, height, "added beam");
        Ok(())
    }

    /// Look up a beam.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::UnknownBeam`] when `key` is not part of this assembly.
    pub fn find_by_key(&self, key: BeamKey) -> Result<&Beam, AssemblyError> {
        self.beams.get(&key).ok_or(AssemblyError::UnknownBeam(key))
    }

    /// Look up a joint.
    #[must_use]
    pub fn joint(&self, key: JointKey) -> Option<&Joint> {
        self.joints.get(&key)
    }

    /// Iterate over the beams in key order.
    pub fn beams(&self) -> impl Iterator<Item = &Beam> {
        self.beams.values()
    }

    /// Iterate over the joints in key order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values()
    }

    /// Beams connected to `key` through a joint, in key order.
    #[must_use]
    pub fn neighbors(&self, key: BeamKey) -> Vec<BeamKey> {
        let Some(&node) = self.beam_nodes.get(&key) else {
            return Vec::new();
        };
        let neighbors: BTreeSet<BeamKey> = self
            .graph
            .neighbors(node)
            .flat_map(|joint| self.graph.neighbors(joint))
            .filter_map(|n| match self.graph[n] {
                Node::Beam(beam) if beam != key => Some(beam),
                _ => None,
            })
            .collect();
        neighbors.into_iter().collect()
    }

    /// Joints attached to beam `key`, in key order.
    #[must_use]
    pub fn joints_of(&self, key: BeamKey) -> Vec<JointKey> {
        let Some(&node) = self.beam_nodes.get(&key) else {
            return Vec::new();
        };
        let joints: BTreeSet<JointKey> = self
            .graph
            .neighbors(node)
            .filter_map(|n| match self.graph[n] {
                Node::Joint(joint) => Some(joint),
                Node::Beam(_) => None,
            })
            .collect();
        joints.into_iter().collect()
    }

    /// Classify how two beams of the assembly meet.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::UnknownBeam`] for missing beams and
    /// [`AssemblyError::Classification`] when no topology can be determined.
    pub fn classify(&self, a: BeamKey, b: BeamKey) -> Result<Classification, AssemblyError> {
        if a == b {
            return Err(AssemblyError::SelfJoint(a));
        }
        let beam_a = self.find_by_key(a)?;
        let beam_b = self.find_by_key(b)?;
        Ok(classify(beam_a, beam_b, &self.settings)?)
    }

    /// Every pair of beams that meets in a recognised topology.
    ///
    /// Pairs that cannot be classified are skipped.
    #[must_use]
    pub fn find_intersecting_pairs(&self) -> Vec<Classification> {
        let beams: Vec<&Beam> = self.beams.values().collect();
        let mut pairs = Vec::new();
        for (i, a) in beams.iter().enumerate() {
            for b in &beams[i + 1..] {
                match classify(a, b, &self.settings) {
                    Ok(classification) => pairs.push(classification),
                    Err(err) => debug!(%err, "skipping pair"),
                }
            }
        }
        pairs
    }

    /// Create a joint of `kind` between two beams and resolve its features immediately.
    ///
    /// The beams are classified first; for T topologies the beam whose end participates
    /// becomes the main beam regardless of argument order. A joint that fails to resolve
    /// stays registered in the [`JointState::JoiningFailed`] state with no features applied.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Classification`] when the beams do not meet in the topology
    /// supported by `kind` and [`AssemblyError::Joining`] when the features cannot be
    /// computed.
    pub fn create_joint(
        &mut self,
        kind: JointKind,
        a: BeamKey,
        b: BeamKey,
        options: JointOptions,
    ) -> Result<JointKey, AssemblyError> {
        let classification = self.classify_for(kind, a, b)?;
        let key = JointKey(self.next_joint);
        self.register_joint(Joint::new(
            key,
            kind,
            classification.main,
            classification.cross,
            options,
        ))?;
        info!(joint = %key, kind = kind.name(), main = %classification.main, cross = %classification.cross, "created joint");
        self.resolve_joint(key)?;
        Ok(key)
    }

    /// Classify two beams and check that `kind` supports the topology they meet in.
    fn classify_for(
        &self,
        kind: JointKind,
        a: BeamKey,
        b: BeamKey,
    ) -> Result<Classification, AssemblyError> {
        let classification = self.classify(a, b)?;
        if classification.topology != kind.supported_topology() {
            return Err(ClassificationError::TopologyMismatch {
                joint: kind.name(),
                a,
                b,
                expected: kind.supported_topology(),
                found: classification.topology,
            }
            .into());
        }
        Ok(classification)
    }

    /// Add a joint to the registry and connect it to its beams in the graph.
    fn register_joint(&mut self, joint: Joint) -> Result<(), AssemblyError> {
        let key = joint.key();
        if self.joints.contains_key(&key) {
            return Err(AssemblyError::DuplicateJoint(key));
        }
        let mut beam_nodes = Vec::with_capacity(2);
        for beam in joint.beams() {
            let node = self
                .beam_nodes
                .get(&beam)
                .ok_or(AssemblyError::UnknownBeam(beam))?;
            beam_nodes.push(*node);
        }
        let node = self.graph.add_node(Node::Joint(key));
        for beam_node in beam_nodes {
            self.graph.add_edge(node, beam_node, ());
        }
        self.joints.insert(key, joint);
        self.next_joint = self.next_joint.max(key.0 + 1);
        Ok(())
    }

    /// Recompute the features of a single joint, replacing its earlier contributions.
    ///
    /// Resolving the same joint twice leaves the beams unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::UnknownJoint`] for a missing joint and
    /// [`AssemblyError::Joining`] when the features cannot be computed; in that case no
    /// feature of the joint remains on its beams.
    pub fn resolve_joint(&mut self, key: JointKey) -> Result<(), AssemblyError> {
        let joint = self
            .joints
            .get(&key)
            .ok_or(AssemblyError::UnknownJoint(key))?;
        for beam in joint.beams() {
            if let Some(beam) = self.beams.get_mut(&beam) {
                beam.remove_joint_contributions(key);
            }
        }
        match self.compute(key)? {
            Ok(output) => {
                self.set_state(key, JointState::FeaturesPending);
                self.apply(output);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "joint rolled back");
                self.set_state(key, JointState::JoiningFailed);
                Err(err.into())
            }
        }
    }

    /// Recompute every joint against the unmodified beam geometry and apply the results.
    ///
    /// Features are computed for all joints before any of them is applied, so the result
    /// does not depend on the order joints were created in. Failed joints are rolled back
    /// and reported; the remaining joints are still applied.
    pub fn resolve_all(&mut self) -> ResolutionReport {
        for beam in self.beams.values_mut() {
            beam.reset();
        }
        let keys: Vec<JointKey> = self.joints.keys().copied().collect();
        let mut outputs = Vec::new();
        let mut report = ResolutionReport::default();
        for key in keys {
            match self.compute(key) {
                Ok(Ok(output)) => {
                    self.set_state(key, JointState::FeaturesPending);
                    outputs.push(output);
                }
                Ok(Err(err)) => {
                    warn!(%err, "joint rolled back");
                    self.set_state(key, JointState::JoiningFailed);
                    report.failures.push(err);
                }
                Err(err) => warn!(%err, "joint skipped"),
            }
        }
        for output in outputs {
            report.resolved.push(output.joint);
            self.apply(output);
        }
        info!(
            resolved = report.resolved.len(),
            failed = report.failures.len(),
            "resolved assembly"
        );
        report
    }

    /// Compute the output of joint `key` against the current beams.
    fn compute(&self, key: JointKey) -> Result<Result<JointOutput, JoiningError>, AssemblyError> {
        let joint = self
            .joints
            .get(&key)
            .ok_or(AssemblyError::UnknownJoint(key))?;
        let main = self.find_by_key(joint.main())?;
        let cross = self.find_by_key(joint.cross())?;
        Ok(joint.compute(main, cross, &self.settings))
    }

    /// Add the features and extensions of `output` to its beams.
    fn apply(&mut self, output: JointOutput) {
        for update in output.updates {
            let Some(beam) = self.beams.get_mut(&update.beam) else {
                continue;
            };
            for feature in update.features {
                beam.add_feature(output.joint, feature);
            }
            if let Some((start, end)) = update.extension {
                beam.add_blank_extension(start, end, output.joint);
            }
        }
        self.set_state(output.joint, JointState::FeaturesApplied);
    }

    /// Update the state of joint `key` if it exists.
    fn set_state(&mut self, key: JointKey, state: JointState) {
        if let Some(joint) = self.joints.get_mut(&key) {
            joint.set_state(state);
        }
    }

    /// Plain data describing the beams, joints and settings.
    #[must_use]
    pub fn to_data(&self) -> AssemblyData {
        AssemblyData {
            settings: self.settings.clone(),
            beams: self.beams.values().map(BeamData::from).collect(),
            joints: self.joints.values().map(JointData::from).collect(),
        }
    }

    /// Rebuild an assembly from plain data and resolve all of its joints.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError`] when a beam is invalid, a beam or joint key is listed twice,
    /// a joint references a missing beam or its beams do not meet in the topology its kind
    /// supports.
    pub fn from_data(data: &AssemblyData) -> Result<Self, AssemblyError> {
        let mut assembly = Self::new(data.settings.clone());
        for beam in &data.beams {
            assembly.insert_beam(
                beam.key,
                Line::new(Point::from(beam.start), Point::from(beam.end)),
                beam.width,
                beam.height,
                Some(Vector::from(beam.z_vector)),
            )?;
        }
        for joint in &data.joints {
            // Restored joints go through the same topology check as new ones.
            let classification = assembly.classify_for(joint.kind, joint.main, joint.cross)?;
            if classification.main != joint.main {
                debug!(joint = %joint.key, main = %classification.main, "restored roles swapped");
            }
            assembly.register_joint(Joint::new(
                joint.key,
                joint.kind,
                classification.main,
                classification.cross,
                joint.options,
            ))?;
        }
        assembly.resolve_all();
        Ok(assembly)
    }

    /// Serialize the assembly to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, AssemblyError> {
        Ok(serde_json::to_string_pretty(&self.to_data())?)
    }

    /// Deserialize an assembly from JSON and resolve its joints.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Serialization`] for malformed input and any error of
    /// [`Assembly::from_data`].
    pub fn from_json(json: &str) -> Result<Self, AssemblyError> {
        let data: AssemblyData = serde_json::from_str(json)?;
        Self::from_data(&data)
    }
}

/// Serialized form of a beam.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamData {
    /// Beam key.
    pub key: BeamKey,
    /// Centerline start.
    pub start: [f64; 3],
    /// Centerline end.
    pub end: [f64; 3],
    /// Cross-section width.
    pub width: f64,
    /// Cross-section height.
    pub height: f64,
    /// Local Z axis of the cross-section.
    pub z_vector: [f64; 3],
}

impl From<&Beam> for BeamData {
    fn from(beam: &Beam) -> Self {
        let line = beam.centerline();
        Self {
            key: beam.key(),
            start: line.start.coords.into(),
            end: line.end.coords.into(),
            width: beam.width(),
            height: beam.height(),
            z_vector: beam.zaxis().into(),
        }
    }
}

/// Serialized form of a joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointData {
    /// Joint key.
    pub key: JointKey,
    /// Joint kind.
    pub kind: JointKind,
    /// Main beam.
    pub main: BeamKey,
    /// Cross beam.
    pub cross: BeamKey,
    /// Joint options.
    pub options: JointOptions,
}

impl From<&Joint> for JointData {
    fn from(joint: &Joint) -> Self {
        Self {
            key: joint.key(),
            kind: joint.kind(),
            main: joint.main(),
            cross: joint.cross(),
            options: *joint.options(),
        }
    }
}

/// Serialized form of an assembly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssemblyData {
    /// Tolerances and precision.
    #[serde(default)]
    pub settings: Settings,
    /// Beams in key order.
    pub beams: Vec<BeamData>,
    /// Joints in key order.
    pub joints: Vec<JointData>,
}
