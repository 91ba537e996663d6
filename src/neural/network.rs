//! Feed-forward network structure and forward propagation.

use crate::error::EvoError;
use ndarray::{Array1, Array2};
use rand::Rng;

/// Weight initialization policy for new networks and mutation draws.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Each weight uniform in `[-bound, bound)`.
    Uniform { bound: f32 },
    /// Exponentially-distributed magnitude with a random sign.
    SignedExponential { scale: f32 },
}

impl Default for InitPolicy {
    fn default() -> Self {
        Self::Uniform { bound: 1.0 }
    }
}

impl InitPolicy {
    /// Draw one weight value.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        match *self {
            Self::Uniform { bound } => rng.gen_range(-bound..bound),
            Self::SignedExponential { scale } => {
                let u: f32 = rng.gen();
                let magnitude = -(1.0 - u).ln() * scale;
                if rng.gen_bool(0.5) {
                    magnitude
                } else {
                    -magnitude
                }
            }
        }
    }
}

/// A single fully-connected layer.
///
/// `weights` is `(n_inputs, n_nodes)`; node `j` owns column `j` plus
/// `biases[j]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl Layer {
    fn random<R: Rng>(n_inputs: usize, n_nodes: usize, init: InitPolicy, rng: &mut R) -> Self {
        Self {
            weights: Array2::from_shape_fn((n_inputs, n_nodes), |_| init.sample(rng)),
            biases: Array1::from_shape_fn(n_nodes, |_| init.sample(rng)),
        }
    }

    /// Number of nodes in this layer.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.weights.ncols()
    }

    /// Number of inputs each node takes.
    #[inline]
    pub fn n_inputs(&self) -> usize {
        self.weights.nrows()
    }

    /// Scalar weight count, biases included.
    #[inline]
    pub fn weight_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

/// A multi-layer feed-forward network.
///
/// `topology` holds the hidden-layer widths only; an empty topology
/// degenerates to a single input-to-output layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    pub topology: Vec<usize>,
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub layers: Vec<Layer>,
}

/// `(inputs, nodes)` for each layer implied by a shape request.
fn layer_dims(topology: &[usize], n_inputs: usize, n_outputs: usize) -> Vec<(usize, usize)> {
    let mut dims = Vec::with_capacity(topology.len() + 1);
    let mut prev = n_inputs;
    for &width in topology {
        dims.push((prev, width));
        prev = width;
    }
    dims.push((prev, n_outputs));
    dims
}

impl Network {
    /// Create a network with randomly initialized weights.
    pub fn random<R: Rng>(
        topology: &[usize],
        n_inputs: usize,
        n_outputs: usize,
        init: InitPolicy,
        rng: &mut R,
    ) -> Result<Self, EvoError> {
        Self::validate_shape(topology, n_inputs, n_outputs)?;

        let layers = layer_dims(topology, n_inputs, n_outputs)
            .into_iter()
            .map(|(n_in, n_nodes)| Layer::random(n_in, n_nodes, init, rng))
            .collect();

        Ok(Self {
            topology: topology.to_vec(),
            n_inputs,
            n_outputs,
            layers,
        })
    }

    fn validate_shape(
        topology: &[usize],
        n_inputs: usize,
        n_outputs: usize,
    ) -> Result<(), EvoError> {
        if n_inputs == 0 {
            return Err(EvoError::InvalidTopology("n_inputs must be > 0".to_string()));
        }
        if n_outputs == 0 {
            return Err(EvoError::InvalidTopology("n_outputs must be > 0".to_string()));
        }
        if let Some(pos) = topology.iter().position(|&w| w == 0) {
            return Err(EvoError::InvalidTopology(format!(
                "hidden layer {} has zero nodes",
                pos
            )));
        }
        Ok(())
    }

    /// Feed `inputs` through every layer.
    ///
    /// Each node computes `tanh(sum(w * x) - bias)`; the bias is
    /// subtracted, not added.
    #[inline]
    pub fn forward(&self, inputs: &[f32]) -> Result<Vec<f32>, EvoError> {
        if inputs.len() != self.n_inputs {
            return Err(EvoError::DimensionMismatch {
                expected: self.n_inputs,
                found: inputs.len(),
            });
        }

        let mut activation = Array1::from_vec(inputs.to_vec());
        for layer in &self.layers {
            activation = activation.dot(&layer.weights) - &layer.biases;
            activation.mapv_inplace(f32::tanh);
        }

        Ok(activation.to_vec())
    }

    /// Set every weight and bias to zero.
    pub fn zero(&mut self) {
        for layer in &mut self.layers {
            layer.weights.fill(0.0);
            layer.biases.fill(0.0);
        }
    }

    /// A zero-filled network of the same shape, for velocity tensors.
    pub fn zeroed_like(&self) -> Self {
        let mut net = self.clone();
        net.zero();
        net
    }

    /// Total scalar weight count across all layers, biases included.
    pub fn weight_count(&self) -> usize {
        self.layers.iter().map(Layer::weight_count).sum()
    }

    /// Whether another network has an identical shape.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.topology == other.topology
            && self.n_inputs == other.n_inputs
            && self.n_outputs == other.n_outputs
    }

    /// Full shape as `[n_inputs, hidden.., n_outputs]`, for diagnostics.
    pub fn shape_signature(&self) -> Vec<usize> {
        let mut sig = Vec::with_capacity(self.topology.len() + 2);
        sig.push(self.n_inputs);
        sig.extend_from_slice(&self.topology);
        sig.push(self.n_outputs);
        sig
    }

    /// Flatten all weights in canonical (layer, node, weight-in-node)
    /// order, bias last within each node.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.weight_count());
        for layer in &self.layers {
            for j in 0..layer.n_nodes() {
                for i in 0..layer.n_inputs() {
                    flat.push(layer.weights[[i, j]]);
                }
                flat.push(layer.biases[j]);
            }
        }
        flat
    }

    /// Overwrite all weights from a canonical-order flat slice.
    pub fn assign_flat(&mut self, flat: &[f32]) -> Result<(), EvoError> {
        if flat.len() != self.weight_count() {
            return Err(EvoError::DimensionMismatch {
                expected: self.weight_count(),
                found: flat.len(),
            });
        }

        let mut idx = 0;
        for layer in &mut self.layers {
            for j in 0..layer.biases.len() {
                for i in 0..layer.weights.nrows() {
                    layer.weights[[i, j]] = flat[idx];
                    idx += 1;
                }
                layer.biases[j] = flat[idx];
                idx += 1;
            }
        }
        Ok(())
    }

    /// Rebuild a network from its shape and a canonical-order flat slice.
    pub fn from_flat(
        topology: &[usize],
        n_inputs: usize,
        n_outputs: usize,
        flat: &[f32],
    ) -> Result<Self, EvoError> {
        Self::validate_shape(topology, n_inputs, n_outputs)?;

        let layers = layer_dims(topology, n_inputs, n_outputs)
            .into_iter()
            .map(|(n_in, n_nodes)| Layer {
                weights: Array2::zeros((n_in, n_nodes)),
                biases: Array1::zeros(n_nodes),
            })
            .collect();

        let mut net = Self {
            topology: topology.to_vec(),
            n_inputs,
            n_outputs,
            layers,
        };
        net.assign_flat(flat)?;
        Ok(net)
    }

    /// Check that no weight is NaN or infinite.
    pub fn is_valid(&self) -> bool {
        self.layers.iter().all(|layer| {
            layer.weights.iter().all(|w| w.is_finite())
                && layer.biases.iter().all(|b| b.is_finite())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_layer_shapes() {
        let net = Network::random(&[2, 2, 3, 3], 3, 3, InitPolicy::default(), &mut rng()).unwrap();

        assert_eq!(net.layers.len(), 5);
        let node_counts: Vec<usize> = net.layers.iter().map(Layer::n_nodes).collect();
        assert_eq!(node_counts, vec![2, 2, 3, 3, 3]);

        // weights per node = inputs + 1 (bias)
        let per_node: Vec<usize> = net.layers.iter().map(|l| l.n_inputs() + 1).collect();
        assert_eq!(per_node, vec![4, 3, 3, 4, 4]);

        assert_eq!(net.weight_count(), 47);
    }

    #[test]
    fn test_wide_layer_shapes() {
        let net = Network::random(&[18], 31, 4, InitPolicy::default(), &mut rng()).unwrap();

        assert_eq!(net.layers.len(), 2);
        assert_eq!(net.layers[0].n_nodes(), 18);
        assert_eq!(net.layers[0].n_inputs() + 1, 32);
        assert_eq!(net.layers[1].n_nodes(), 4);
        assert_eq!(net.layers[1].n_inputs() + 1, 19);
        assert_eq!(net.weight_count(), 652);
    }

    #[test]
    fn test_empty_topology_degenerates_to_one_layer() {
        let net = Network::random(&[], 5, 2, InitPolicy::default(), &mut rng()).unwrap();
        assert_eq!(net.layers.len(), 1);
        assert_eq!(net.layers[0].n_inputs(), 5);
        assert_eq!(net.layers[0].n_nodes(), 2);
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        assert!(matches!(
            Network::random(&[3, 0], 3, 3, InitPolicy::default(), &mut rng()),
            Err(EvoError::InvalidTopology(_))
        ));
        assert!(matches!(
            Network::random(&[3], 0, 3, InitPolicy::default(), &mut rng()),
            Err(EvoError::InvalidTopology(_))
        ));
        assert!(matches!(
            Network::random(&[3], 3, 0, InitPolicy::default(), &mut rng()),
            Err(EvoError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_forward_is_deterministic() {
        let net = Network::random(&[5, 5], 4, 3, InitPolicy::default(), &mut rng()).unwrap();
        let inputs = [1.0, 2.0, 3.0, 4.0];

        let first = net.forward(&inputs).unwrap();
        let second = net.forward(&inputs).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_forward_rejects_wrong_input_length() {
        let net = Network::random(&[3], 4, 2, InitPolicy::default(), &mut rng()).unwrap();
        let err = net.forward(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            EvoError::DimensionMismatch {
                expected: 4,
                found: 2
            }
        ));
    }

    #[test]
    fn test_forward_outputs_bounded_by_tanh() {
        let net = Network::random(&[6], 4, 3, InitPolicy::default(), &mut rng()).unwrap();
        let outputs = net.forward(&[0.5, -0.5, 2.0, -2.0]).unwrap();
        assert!(outputs.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_forward_matches_hand_computation() {
        use approx::assert_relative_eq;

        // single node: tanh(w0*x0 + w1*x1 - bias)
        let net = Network::from_flat(&[], 2, 1, &[0.5, -0.25, 0.1]).unwrap();
        let out = net.forward(&[1.0, 2.0]).unwrap();
        let expected = (0.5 * 1.0 + (-0.25) * 2.0 - 0.1f32).tanh();
        assert_relative_eq!(out[0], expected, max_relative = 1e-6);
    }

    #[test]
    fn test_zeroed_like() {
        let net = Network::random(&[4, 4], 3, 2, InitPolicy::default(), &mut rng()).unwrap();
        let velocity = net.zeroed_like();

        assert!(net.same_shape(&velocity));
        assert!(velocity.to_flat().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_flat_roundtrip() {
        let net = Network::random(&[3, 2], 4, 2, InitPolicy::default(), &mut rng()).unwrap();
        let flat = net.to_flat();
        assert_eq!(flat.len(), net.weight_count());

        let rebuilt =
            Network::from_flat(&net.topology, net.n_inputs, net.n_outputs, &flat).unwrap();
        assert_eq!(rebuilt, net);
    }

    #[test]
    fn test_uniform_init_bounded() {
        let net = Network::random(&[8], 8, 4, InitPolicy::Uniform { bound: 1.0 }, &mut rng())
            .unwrap();
        assert!(net.to_flat().iter().all(|&w| (-1.0..1.0).contains(&w)));
    }

    #[test]
    fn test_signed_exponential_init_has_both_signs() {
        let net = Network::random(
            &[8],
            8,
            4,
            InitPolicy::SignedExponential { scale: 0.5 },
            &mut rng(),
        )
        .unwrap();
        assert!(net.is_valid());
        let flat = net.to_flat();
        assert!(flat.iter().any(|&w| w > 0.0));
        assert!(flat.iter().any(|&w| w < 0.0));
    }
}
