//! Flat text persistence for networks.
//!
//! A network file is a single whitespace-delimited token stream:
//! `n_inputs n_outputs n_hidden t1..tk weight weight ...`, with weights in
//! canonical (layer, node, weight-in-node) order and the bias last within
//! each node. The reader re-derives every per-layer shape from the header;
//! it never reads explicit layer dimensions.

use crate::error::EvoError;
use crate::neural::Network;
use std::path::Path;

/// Serialize a network to its token-stream form.
pub fn encode(net: &Network) -> String {
    let mut out = format!(
        "{} {} {}",
        net.n_inputs,
        net.n_outputs,
        net.topology.len()
    );

    for width in &net.topology {
        out.push_str(&format!(" {}", width));
    }
    for weight in net.to_flat() {
        out.push_str(&format!(" {}", weight));
    }

    out
}

/// Parse a network from its token-stream form.
pub fn decode(text: &str) -> Result<Network, EvoError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(EvoError::EncodingLength(format!(
            "expected at least 4 tokens, found {}",
            tokens.len()
        )));
    }

    let n_inputs = parse_count(tokens[0], "n_inputs")?;
    let n_outputs = parse_count(tokens[1], "n_outputs")?;
    let n_hidden = parse_count(tokens[2], "n_hidden")?;

    if tokens.len() < 3 + n_hidden {
        return Err(EvoError::EncodingLength(format!(
            "header declares {} hidden layers but only {} tokens remain",
            n_hidden,
            tokens.len() - 3
        )));
    }

    let topology = tokens[3..3 + n_hidden]
        .iter()
        .map(|t| parse_count(t, "topology entry"))
        .collect::<Result<Vec<usize>, EvoError>>()?;

    let weights = tokens[3 + n_hidden..]
        .iter()
        .map(|t| {
            t.parse::<f32>().map_err(|_| {
                EvoError::EncodingLength(format!("non-numeric weight token '{}'", t))
            })
        })
        .collect::<Result<Vec<f32>, EvoError>>()?;

    let net = Network::from_flat(&topology, n_inputs, n_outputs, &weights).map_err(|e| match e {
        EvoError::DimensionMismatch { expected, found } => EvoError::EncodingLength(format!(
            "declared shape needs {} weights, found {}",
            expected, found
        )),
        other => other,
    })?;

    Ok(net)
}

fn parse_count(token: &str, what: &str) -> Result<usize, EvoError> {
    token
        .parse::<usize>()
        .map_err(|_| EvoError::EncodingLength(format!("bad {} token '{}'", what, token)))
}

/// Write a network to a file.
pub fn to_file<P: AsRef<Path>>(net: &Network, path: P) -> Result<(), EvoError> {
    std::fs::write(path, encode(net))?;
    Ok(())
}

/// Read a network from a file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Network, EvoError> {
    let text = std::fs::read_to_string(path)?;
    decode(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::InitPolicy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample_net() -> Network {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        Network::random(&[3, 3, 3], 3, 3, InitPolicy::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_encode_header() {
        let net = sample_net();
        let text = encode(&net);
        let tokens: Vec<&str> = text.split_whitespace().collect();

        assert_eq!(tokens[0], "3");
        assert_eq!(tokens[1], "3");
        assert_eq!(tokens[2], "3"); // hidden layers, output layer excluded
        assert_eq!(tokens.len(), 6 + net.weight_count());
    }

    #[test]
    fn test_roundtrip() {
        let net = sample_net();
        let rebuilt = decode(&encode(&net)).unwrap();
        assert_eq!(rebuilt, net);
    }

    #[test]
    fn test_file_roundtrip() {
        let net = sample_net();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.net");

        to_file(&net, &path).unwrap();
        let rebuilt = from_file(&path).unwrap();
        assert_eq!(rebuilt, net);
    }

    #[test]
    fn test_too_few_tokens() {
        assert!(matches!(
            decode("3 3 0"),
            Err(EvoError::EncodingLength(_))
        ));
    }

    #[test]
    fn test_weight_count_mismatch() {
        // 1 input, 1 output, no hidden layers: needs exactly 2 weights
        assert!(decode("1 1 0 0.5 0.25").is_ok());
        assert!(matches!(
            decode("1 1 0 0.5 0.25 0.125"),
            Err(EvoError::EncodingLength(_))
        ));
        assert!(matches!(
            decode("1 1 0 0.5 x"),
            Err(EvoError::EncodingLength(_))
        ));
    }

    #[test]
    fn test_corrupt_topology_token() {
        assert!(matches!(
            decode("3 3 one 0.5"),
            Err(EvoError::EncodingLength(_))
        ));
    }
}
