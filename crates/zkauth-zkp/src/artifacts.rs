//! # Artifact Manager
//!
//! Owns the lifecycle of the artifact bundle: compile the circuit contract,
//! run the trusted setup, persist the result, and reload it on restart.
//!
//! ## Layout
//!
//! ```text
//! <artifact_dir>/out            program binary      (served publicly)
//! <artifact_dir>/abi.json       ABI descriptor      (served publicly)
//! <artifact_dir>/proving.key    proving key         (served publicly)
//! <key_dir>/verification.key    verification key    (never served)
//! ```
//!
//! ## Reuse across restarts
//!
//! A second setup produces keys that reject every proof issued against the
//! first, so [`ArtifactManager::initialize`] reuses a persisted bundle when
//! it is complete and consistent: the program is byte-equal to a fresh
//! compile and the verification key is the one the proving key was made
//! with. Anything else is regenerated as a whole and persisted with
//! write-then-rename so readers never see a half-written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::circuit::CircuitContract;
use crate::traits::{CircuitError, CompiledProgram, KeyEncodingError, ProofSystem, SetupError};
use crate::verifier::BundleVerifier;

/// Program binary file name.
pub const PROGRAM_FILE: &str = "out";
/// ABI descriptor file name.
pub const ABI_FILE: &str = "abi.json";
/// Proving key file name.
pub const PROVING_KEY_FILE: &str = "proving.key";
/// Verification key file name (key directory only).
pub const VERIFICATION_KEY_FILE: &str = "verification.key";

/// Errors from the artifact lifecycle.
///
/// All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Compilation failed.
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    /// Trusted setup failed.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Reading or writing an artifact file failed.
    #[error("artifact I/O failed at {}: {source}", .path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Key material could not be encoded or decoded.
    #[error(transparent)]
    KeyEncoding(#[from] KeyEncodingError),

    /// The ABI descriptor could not be encoded or decoded.
    #[error("ABI descriptor error: {0}")]
    Abi(#[from] serde_json::Error),

    /// A persisted bundle exists but does not belong to this build.
    #[error("stale artifact bundle: {0}")]
    Stale(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The public files, byte-exact as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifacts {
    /// Program binary.
    pub program: Vec<u8>,
    /// ABI descriptor as JSON.
    pub abi_json: Vec<u8>,
    /// Encoded proving key.
    pub proving_key: Vec<u8>,
}

/// Program, ABI, and the key pair from one setup run.
pub struct ArtifactBundle<P: ProofSystem> {
    /// Compiled program and ABI.
    pub program: CompiledProgram,
    /// Proving key.
    pub proving_key: P::ProvingKey,
    /// Verification key.
    pub verifying_key: P::VerifyingKey,
    published: PublishedArtifacts,
    encoded_verifying_key: Vec<u8>,
}

impl<P: ProofSystem> ArtifactBundle<P> {
    /// The publicly served files.
    pub fn published(&self) -> &PublishedArtifacts {
        &self.published
    }
}

impl<P: ProofSystem> std::fmt::Debug for ArtifactBundle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("circuit", &self.program.abi.circuit)
            .field("version", &self.program.abi.version)
            .field("scheme", &self.program.abi.scheme)
            .field("program_bytes", &self.published.program.len())
            .field("proving_key_bytes", &self.published.proving_key.len())
            .finish()
    }
}

/// Compiles, sets up, persists, and reloads the artifact bundle.
#[derive(Debug, Clone)]
pub struct ArtifactManager<P: ProofSystem> {
    system: P,
    contract: CircuitContract,
    artifact_dir: PathBuf,
    key_dir: PathBuf,
}

impl<P: ProofSystem> ArtifactManager<P> {
    /// Manager for the canonical contract.
    pub fn new(system: P, artifact_dir: impl Into<PathBuf>, key_dir: impl Into<PathBuf>) -> Self {
        Self {
            system,
            contract: CircuitContract::sha256_packed(),
            artifact_dir: artifact_dir.into(),
            key_dir: key_dir.into(),
        }
    }

    /// Override the contract (compilation rejects anything unsupported).
    pub fn with_contract(mut self, contract: CircuitContract) -> Self {
        self.contract = contract;
        self
    }

    /// The proof system in use.
    pub fn system(&self) -> &P {
        &self.system
    }

    /// Public artifact directory.
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Trusted key directory.
    pub fn key_dir(&self) -> &Path {
        &self.key_dir
    }

    /// Compile the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Circuit`] if the contract is unsupported.
    pub fn compile(&self) -> Result<CompiledProgram, ArtifactError> {
        Ok(self.system.compile(&self.contract)?)
    }

    /// Run the trusted setup and encode the resulting keys.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Setup`] or [`ArtifactError::KeyEncoding`].
    pub fn setup(&self, program: CompiledProgram) -> Result<ArtifactBundle<P>, ArtifactError> {
        let (proving_key, verifying_key) = self.system.setup(&program)?;
        self.assemble(program, proving_key, verifying_key)
    }

    fn assemble(
        &self,
        program: CompiledProgram,
        proving_key: P::ProvingKey,
        verifying_key: P::VerifyingKey,
    ) -> Result<ArtifactBundle<P>, ArtifactError> {
        let published = PublishedArtifacts {
            program: program.program.clone(),
            abi_json: serde_json::to_vec_pretty(&program.abi)?,
            proving_key: self.system.encode_proving_key(&proving_key)?,
        };
        let encoded_verifying_key = self.system.encode_verifying_key(&verifying_key)?;
        Ok(ArtifactBundle {
            program,
            proving_key,
            verifying_key,
            published,
            encoded_verifying_key,
        })
    }

    /// Write the bundle to disk.
    ///
    /// Each file is written to a temporary sibling and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] naming the path that failed.
    pub fn persist(&self, bundle: &ArtifactBundle<P>) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.artifact_dir).map_err(io_error(&self.artifact_dir))?;
        fs::create_dir_all(&self.key_dir).map_err(io_error(&self.key_dir))?;

        let published = bundle.published();
        write_atomic(&self.key_dir.join(VERIFICATION_KEY_FILE), &bundle.encoded_verifying_key)?;
        write_atomic(&self.artifact_dir.join(PROVING_KEY_FILE), &published.proving_key)?;
        write_atomic(&self.artifact_dir.join(ABI_FILE), &published.abi_json)?;
        write_atomic(&self.artifact_dir.join(PROGRAM_FILE), &published.program)?;

        tracing::info!(
            artifact_dir = %self.artifact_dir.display(),
            key_dir = %self.key_dir.display(),
            "persisted artifact bundle"
        );
        Ok(())
    }

    /// Load a persisted bundle.
    ///
    /// Returns `Ok(None)` when no bundle file exists at all.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Stale`] for an incomplete bundle, a program
    /// that differs from a fresh compile, or mismatched keys, and
    /// [`ArtifactError::KeyEncoding`]/[`ArtifactError::Abi`] for undecodable
    /// files.
    pub fn load(&self) -> Result<Option<ArtifactBundle<P>>, ArtifactError> {
        let program_path = self.artifact_dir.join(PROGRAM_FILE);
        let abi_path = self.artifact_dir.join(ABI_FILE);
        let pk_path = self.artifact_dir.join(PROVING_KEY_FILE);
        let vk_path = self.key_dir.join(VERIFICATION_KEY_FILE);

        let paths = [&program_path, &abi_path, &pk_path, &vk_path];
        let present = paths.iter().filter(|p| p.exists()).count();
        if present == 0 {
            return Ok(None);
        }
        if present < paths.len() {
            return Err(ArtifactError::Stale(format!(
                "{present} of {} bundle files present",
                paths.len()
            )));
        }

        let expected = self.compile()?;
        let program = fs::read(&program_path).map_err(io_error(&program_path))?;
        if program != expected.program {
            return Err(ArtifactError::Stale(
                "persisted program differs from the current circuit".to_string(),
            ));
        }
        let abi_json = fs::read(&abi_path).map_err(io_error(&abi_path))?;
        if serde_json::from_slice::<crate::circuit::Abi>(&abi_json)? != expected.abi {
            return Err(ArtifactError::Stale(
                "persisted ABI differs from the current circuit".to_string(),
            ));
        }

        let pk_bytes = fs::read(&pk_path).map_err(io_error(&pk_path))?;
        let vk_bytes = fs::read(&vk_path).map_err(io_error(&vk_path))?;
        let proving_key = self.system.decode_proving_key(&pk_bytes)?;
        let verifying_key = self.system.decode_verifying_key(&vk_bytes)?;
        if !self.system.keys_match(&proving_key, &verifying_key) {
            return Err(ArtifactError::Stale(
                "verification key does not belong to the proving key".to_string(),
            ));
        }

        Ok(Some(ArtifactBundle {
            program: expected,
            proving_key,
            verifying_key,
            published: PublishedArtifacts {
                program,
                abi_json,
                proving_key: pk_bytes,
            },
            encoded_verifying_key: vk_bytes,
        }))
    }

    /// Load only what a prover needs: the program and the public proving key.
    ///
    /// Does not touch the key directory.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Stale`] if the program does not match this
    /// build, or I/O and decoding errors.
    pub fn load_proving_key(&self) -> Result<P::ProvingKey, ArtifactError> {
        let program_path = self.artifact_dir.join(PROGRAM_FILE);
        let pk_path = self.artifact_dir.join(PROVING_KEY_FILE);
        let program = fs::read(&program_path).map_err(io_error(&program_path))?;
        if program != self.compile()?.program {
            return Err(ArtifactError::Stale(
                "published program differs from the current circuit".to_string(),
            ));
        }
        let pk_bytes = fs::read(&pk_path).map_err(io_error(&pk_path))?;
        Ok(self.system.decode_proving_key(&pk_bytes)?)
    }

    /// Load only the trusted verification key.
    ///
    /// # Errors
    ///
    /// Returns I/O and decoding errors.
    pub fn load_verifying_key(&self) -> Result<P::VerifyingKey, ArtifactError> {
        let vk_path = self.key_dir.join(VERIFICATION_KEY_FILE);
        let vk_bytes = fs::read(&vk_path).map_err(io_error(&vk_path))?;
        Ok(self.system.decode_verifying_key(&vk_bytes)?)
    }

    /// Produce a ready bundle: reuse a consistent persisted one, or compile,
    /// set up, and persist a new one.
    ///
    /// With `regenerate` set, any persisted bundle is replaced.
    ///
    /// # Errors
    ///
    /// Any compile, setup, or persist failure. Callers must not serve
    /// traffic on error.
    pub fn initialize(&self, regenerate: bool) -> Result<ArtifactBundle<P>, ArtifactError> {
        if !regenerate {
            match self.load() {
                Ok(Some(bundle)) => {
                    tracing::info!(
                        artifact_dir = %self.artifact_dir.display(),
                        scheme = self.system.scheme(),
                        "reusing persisted artifact bundle"
                    );
                    return Ok(bundle);
                }
                Ok(None) => {
                    tracing::info!("no artifact bundle found, generating");
                }
                Err(err @ ArtifactError::Io { .. }) => return Err(err),
                Err(err) => {
                    tracing::warn!(error = %err, "discarding persisted artifact bundle");
                }
            }
        }

        let started = std::time::Instant::now();
        let program = self.compile()?;
        let bundle = self.setup(program)?;
        self.persist(&bundle)?;
        tracing::info!(
            scheme = self.system.scheme(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated artifact bundle"
        );
        Ok(bundle)
    }
}

impl<P: ProofSystem + Clone> ArtifactManager<P> {
    /// A verifier bound to a bundle's verification key.
    pub fn verifier(&self, bundle: &ArtifactBundle<P>) -> BundleVerifier<P> {
        BundleVerifier::new(self.system.clone(), bundle.verifying_key.clone())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut file = fs::File::create(&tmp).map_err(io_error(&tmp))?;
        file.write_all(bytes).map_err(io_error(&tmp))?;
        file.sync_all().map_err(io_error(&tmp))?;
    }
    fs::rename(&tmp, path).map_err(io_error(path))
}
