//! # Groth16 Backend (BN254)
//!
//! Real proofs via `ark-groth16` over the BN254 curve, the same curve
//! ZoKrates and the EVM precompiles use.
//!
//! ## Program format
//!
//! `compile` synthesizes [`CommitmentCircuit`] in setup mode and serializes
//! its R1CS matrices behind an 8-byte header (`b"ZKAP"` magic, little-endian
//! contract version). The output is deterministic for a given contract and
//! arkworks version, which is what lets the artifact manager detect a stale
//! bundle by recompiling.
//!
//! ## Key encodings
//!
//! - Proving key: uncompressed, loaded without subgroup checks (it is our
//!   own artifact and checking it costs seconds).
//! - Verifying key: compressed, fully validated on load.
//! - Proofs: compressed, fully validated, hex-encoded inside JSON.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{
    prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey,
};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use zkauth_core::FieldElement;

use crate::circuit::{to_field, Abi, CircuitContract, CommitmentCircuit, CommitmentWitness};
use crate::traits::{
    CircuitError, CompiledProgram, KeyEncodingError, ProofError, ProofSystem, SetupError,
    VerifyError,
};

/// Scheme tag carried in ABI and proofs.
pub const SCHEME: &str = "g16";

/// Curve name carried in ABI and proofs.
pub const CURVE: &str = "bn254";

const PROGRAM_MAGIC: &[u8; 4] = b"ZKAP";
const HEADER_LEN: usize = 8;

/// Groth16 over BN254.
#[derive(Debug, Clone, Copy, Default)]
pub struct Groth16ProofSystem;

/// Verifying key with its pairing-prepared form cached.
#[derive(Clone)]
pub struct Groth16VerifyingKey {
    vk: VerifyingKey<Bn254>,
    prepared: PreparedVerifyingKey<Bn254>,
}

impl Groth16VerifyingKey {
    fn new(vk: VerifyingKey<Bn254>) -> Self {
        let prepared = prepare_verifying_key(&vk);
        Self { vk, prepared }
    }

    /// Number of public inputs this key evaluates.
    pub fn num_public_inputs(&self) -> usize {
        self.vk.gamma_abc_g1.len().saturating_sub(1)
    }
}

impl std::fmt::Debug for Groth16VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Groth16VerifyingKey")
            .field("public_inputs", &self.num_public_inputs())
            .finish()
    }
}

/// A Groth16 proof as it travels in a login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    /// Scheme tag (`"g16"`).
    pub scheme: String,
    /// Curve name (`"bn254"`).
    pub curve: String,
    /// Hex of the compressed `(A, B, C)` points.
    pub proof: String,
}

#[derive(CanonicalSerialize, CanonicalDeserialize)]
struct ProgramBody {
    num_instance_variables: u64,
    num_witness_variables: u64,
    num_constraints: u64,
    matrices: Vec<SparseMatrix>,
}

/// Row-major sparse matrix, flattened.
#[derive(CanonicalSerialize, CanonicalDeserialize)]
struct SparseMatrix {
    row_lengths: Vec<u64>,
    columns: Vec<u64>,
    coefficients: Vec<Fr>,
}

impl SparseMatrix {
    fn from_rows(rows: &[Vec<(Fr, usize)>]) -> Self {
        let mut out = Self {
            row_lengths: Vec::with_capacity(rows.len()),
            columns: Vec::new(),
            coefficients: Vec::new(),
        };
        for row in rows {
            out.row_lengths.push(row.len() as u64);
            for (coeff, col) in row {
                out.coefficients.push(*coeff);
                out.columns.push(*col as u64);
            }
        }
        out
    }
}

fn decode_program(bytes: &[u8]) -> Result<(u32, ProgramBody), SetupError> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != PROGRAM_MAGIC {
        return Err(SetupError::MalformedProgram(
            "missing program header".to_string(),
        ));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[4..HEADER_LEN]);
    let body = ProgramBody::deserialize_compressed(&bytes[HEADER_LEN..])
        .map_err(|e| SetupError::MalformedProgram(e.to_string()))?;
    Ok((u32::from_le_bytes(version), body))
}

impl ProofSystem for Groth16ProofSystem {
    type Proof = Groth16Proof;
    type VerifyingKey = Groth16VerifyingKey;
    type ProvingKey = ProvingKey<Bn254>;

    fn scheme(&self) -> &'static str {
        SCHEME
    }

    fn compile(&self, contract: &CircuitContract) -> Result<CompiledProgram, CircuitError> {
        contract.validate()?;

        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        CommitmentCircuit::<Fr>::blank()
            .generate_constraints(cs.clone())
            .map_err(|e| CircuitError::Synthesis(e.to_string()))?;
        cs.finalize();
        let matrices = cs
            .to_matrices()
            .ok_or_else(|| CircuitError::Synthesis("constraint matrices unavailable".to_string()))?;

        let body = ProgramBody {
            num_instance_variables: matrices.num_instance_variables as u64,
            num_witness_variables: matrices.num_witness_variables as u64,
            num_constraints: matrices.num_constraints as u64,
            matrices: vec![
                SparseMatrix::from_rows(&matrices.a),
                SparseMatrix::from_rows(&matrices.b),
                SparseMatrix::from_rows(&matrices.c),
            ],
        };
        let mut program = Vec::with_capacity(HEADER_LEN + body.compressed_size());
        program.extend_from_slice(PROGRAM_MAGIC);
        program.extend_from_slice(&contract.version.to_le_bytes());
        body.serialize_compressed(&mut program)
            .map_err(|e| CircuitError::Synthesis(e.to_string()))?;

        tracing::debug!(
            constraints = matrices.num_constraints,
            witnesses = matrices.num_witness_variables,
            bytes = program.len(),
            "compiled commitment circuit"
        );

        Ok(CompiledProgram {
            program,
            abi: Abi::for_contract(contract, SCHEME, CURVE),
        })
    }

    fn setup(
        &self,
        program: &CompiledProgram,
    ) -> Result<(Self::ProvingKey, Self::VerifyingKey), SetupError> {
        let (version, body) = decode_program(&program.program)?;
        let contract = CircuitContract::sha256_packed();
        if version != contract.version || program.abi.version != contract.version {
            return Err(SetupError::MalformedProgram(format!(
                "program version {version} does not match circuit version {}",
                contract.version
            )));
        }

        let (pk, vk) =
            Groth16::<Bn254>::circuit_specific_setup(CommitmentCircuit::<Fr>::blank(), &mut OsRng)
                .map_err(|e| SetupError::KeyGeneration(e.to_string()))?;

        if vk.gamma_abc_g1.len() as u64 != body.num_instance_variables {
            return Err(SetupError::ShapeMismatch(format!(
                "verifying key covers {} instance variables, program declares {}",
                vk.gamma_abc_g1.len(),
                body.num_instance_variables
            )));
        }

        Ok((pk, Groth16VerifyingKey::new(vk)))
    }

    fn prove(
        &self,
        pk: &Self::ProvingKey,
        witness: &CommitmentWitness,
    ) -> Result<Self::Proof, ProofError> {
        if !witness.is_consistent() {
            return Err(ProofError::Unsatisfied(
                "hash_input does not hash to stored_hash".to_string(),
            ));
        }
        let proof =
            Groth16::<Bn254>::prove(pk, CommitmentCircuit::<Fr>::assigned(witness), &mut OsRng)
                .map_err(|e| ProofError::GenerationFailed(e.to_string()))?;
        let mut bytes = Vec::with_capacity(proof.compressed_size());
        proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))?;
        Ok(Groth16Proof {
            scheme: SCHEME.to_string(),
            curve: CURVE.to_string(),
            proof: hex::encode(bytes),
        })
    }

    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public_inputs: &[FieldElement],
    ) -> Result<bool, VerifyError> {
        if proof.scheme != SCHEME || proof.curve != CURVE {
            return Err(VerifyError::MalformedProof(format!(
                "expected {SCHEME}/{CURVE} proof, got {}/{}",
                proof.scheme, proof.curve
            )));
        }
        if public_inputs.len() != vk.num_public_inputs() {
            return Err(VerifyError::KeyMismatch(format!(
                "key expects {} public inputs, got {}",
                vk.num_public_inputs(),
                public_inputs.len()
            )));
        }
        let bytes =
            hex::decode(&proof.proof).map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        let proof = Proof::<Bn254>::deserialize_compressed(&bytes[..])
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        let inputs: Vec<Fr> = public_inputs.iter().map(to_field).collect();

        Groth16::<Bn254>::verify_with_processed_vk(&vk.prepared, &inputs, &proof)
            .map_err(|e| VerifyError::KeyMismatch(e.to_string()))
    }

    fn encode_proving_key(&self, pk: &Self::ProvingKey) -> Result<Vec<u8>, KeyEncodingError> {
        let mut bytes = Vec::with_capacity(pk.uncompressed_size());
        pk.serialize_uncompressed(&mut bytes)
            .map_err(|e| KeyEncodingError(e.to_string()))?;
        Ok(bytes)
    }

    fn decode_proving_key(&self, bytes: &[u8]) -> Result<Self::ProvingKey, KeyEncodingError> {
        ProvingKey::<Bn254>::deserialize_uncompressed_unchecked(bytes)
            .map_err(|e| KeyEncodingError(e.to_string()))
    }

    fn encode_verifying_key(&self, vk: &Self::VerifyingKey) -> Result<Vec<u8>, KeyEncodingError> {
        let mut bytes = Vec::with_capacity(vk.vk.compressed_size());
        vk.vk
            .serialize_compressed(&mut bytes)
            .map_err(|e| KeyEncodingError(e.to_string()))?;
        Ok(bytes)
    }

    fn decode_verifying_key(&self, bytes: &[u8]) -> Result<Self::VerifyingKey, KeyEncodingError> {
        VerifyingKey::<Bn254>::deserialize_compressed(bytes)
            .map(Groth16VerifyingKey::new)
            .map_err(|e| KeyEncodingError(e.to_string()))
    }

    fn keys_match(&self, pk: &Self::ProvingKey, vk: &Self::VerifyingKey) -> bool {
        pk.vk == vk.vk
    }
}
