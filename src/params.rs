//! Pipeline parameters and their replication from the root PE.

use crate::collective::broadcast;
use crate::error::ChainError;
use crate::group::{WorkerGroup, ROOT_PE};

use serde::{Deserialize, Serialize};

/// The four inputs of a chain run. Identical on every PE once replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParameters {
    /// rows and columns of the generated matrix
    pub nelts: u32,
    pub seed: u32,
    /// percentage of the value range that passes the threshold
    pub thresh_percent: u32,
    /// number of cells selected by winnowing
    pub winnow_nelts: u32,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        PipelineParameters {
            nelts: 100,
            seed: 2,
            thresh_percent: 100,
            winnow_nelts: 100,
        }
    }
}

const STDIN_USAGE: &str =
    "expected four non-negative integers on stdin: nelts seed thresh_percent winnow_nelts";

impl PipelineParameters {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.thresh_percent > 100 {
            return Err(ChainError::configuration(format!(
                "threshold percentage {} is above 100",
                self.thresh_percent
            )));
        }
        let cells = self.nelts as u64 * self.nelts as u64;
        if self.winnow_nelts as u64 > cells {
            return Err(ChainError::configuration(format!(
                "cannot select {} cells from a {}x{} matrix",
                self.winnow_nelts, self.nelts, self.nelts
            )));
        }
        Ok(())
    }

    /// Parse `nelts seed thresh_percent winnow_nelts`, separated by whitespace.
    pub fn parse(input: &str) -> Result<PipelineParameters, ChainError> {
        let values = input
            .split_whitespace()
            .map(|token| token.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ChainError::configuration(format!("{STDIN_USAGE} ({e})")))?;
        match values[..] {
            [nelts, seed, thresh_percent, winnow_nelts] => Ok(PipelineParameters {
                nelts,
                seed,
                thresh_percent,
                winnow_nelts,
            }),
            _ => Err(ChainError::configuration(format!(
                "{STDIN_USAGE} (got {})",
                values.len()
            ))),
        }
    }

    /// Encoded size of a parameter set; the same on every PE.
    pub fn wire_len() -> Result<usize, ChainError> {
        bincode::serialized_size(&PipelineParameters::default())
            .map(|len| len as usize)
            .map_err(|e| ChainError::transport(format!("unable to size parameters: {e}")))
    }

    pub fn encode(&self) -> Result<Vec<u8>, ChainError> {
        bincode::serialize(self)
            .map_err(|e| ChainError::transport(format!("unable to encode parameters: {e}")))
    }

    pub fn decode(bytes: &[u8]) -> Result<PipelineParameters, ChainError> {
        bincode::deserialize(bytes)
            .map_err(|e| ChainError::transport(format!("unable to decode parameters: {e}")))
    }

    /// Root obtains the parameters from `intake` and broadcasts them; every
    /// PE blocks until it holds the same validated copy.
    ///
    /// `intake` only runs on the root. If it fails, the root returns its
    /// error and every other PE returns a configuration error.
    pub fn replicate<F>(group: &WorkerGroup, intake: F) -> Result<PipelineParameters, ChainError>
    where
        F: FnOnce() -> Result<PipelineParameters, ChainError>,
    {
        let wire_len = PipelineParameters::wire_len()?;
        // status byte, then the encoded parameters
        let mut frame = vec![0u8; wire_len + 1];
        let mut root_error = None;
        if group.my_pe() == ROOT_PE {
            let encoded = intake().and_then(|params| {
                params.validate()?;
                params.encode()
            });
            match encoded {
                Ok(bytes) if bytes.len() == wire_len => {
                    frame[0] = 1;
                    frame[1..].copy_from_slice(&bytes);
                }
                Ok(bytes) => {
                    root_error = Some(ChainError::transport(format!(
                        "parameters encoded to {} bytes, expected {wire_len}",
                        bytes.len()
                    )))
                }
                Err(e) => root_error = Some(e),
            }
        }

        broadcast(group, &mut frame, ROOT_PE)?;

        if let Some(e) = root_error {
            return Err(e);
        }
        if frame[0] == 0 {
            return Err(ChainError::configuration(
                "pe 0 could not read the parameters",
            ));
        }
        PipelineParameters::decode(&frame[1..])
    }
}
