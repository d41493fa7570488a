//! # Circuit Contract
//!
//! The fixed statement every proof attests to:
//!
//! ```text
//! sha256_packed(hash_input[0..4]) == stored_hash[0..2]
//! ```
//!
//! where `hash_input` is private and `stored_hash` is public. This module is
//! the single source of truth for:
//!
//! - **Secret encoding.** Secret bytes are right-padded with zeros to a
//!   64-byte block. Chunk `i` is bytes `16i..16i+16` read as a big-endian
//!   128-bit integer.
//! - **Commitment split.** Digest bytes `0..16` and `16..32`, each read
//!   big-endian, become commitment elements 0 and 1.
//! - **Hash function.** Standard SHA-256 (with its own padding) over the
//!   64-byte block.
//!
//! Clients that compute commitments with any other encoding produce proofs
//! that are sound but never match a stored commitment. Any change here must
//! bump [`CIRCUIT_VERSION`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};
use zkauth_core::{Commitment, FieldElement, ValidationError, COMMITMENT_LEN};

use crate::traits::CircuitError;

/// Contract identifier embedded in the program binary and ABI.
pub const CIRCUIT_NAME: &str = "sha256_packed_commitment";

/// Contract version. Bumping it invalidates every stored commitment.
pub const CIRCUIT_VERSION: u32 = 1;

/// Number of private field-element chunks.
pub const HASH_INPUT_CHUNKS: usize = 4;

/// Bit width of each private chunk.
pub const CHUNK_BITS: usize = 128;

/// Secret block size in bytes (`HASH_INPUT_CHUNKS * CHUNK_BITS / 8`).
pub const SECRET_BYTES: usize = 64;

const CHUNK_BYTES: usize = CHUNK_BITS / 8;

/// Descriptor of the statement to compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitContract {
    /// Contract identifier.
    pub name: String,
    /// Contract version.
    pub version: u32,
    /// Number of private input chunks.
    pub hash_input_chunks: usize,
    /// Bits per private chunk.
    pub chunk_bits: usize,
    /// Number of public commitment elements.
    pub commitment_len: usize,
}

impl CircuitContract {
    /// The one supported contract.
    pub fn sha256_packed() -> Self {
        Self {
            name: CIRCUIT_NAME.to_string(),
            version: CIRCUIT_VERSION,
            hash_input_chunks: HASH_INPUT_CHUNKS,
            chunk_bits: CHUNK_BITS,
            commitment_len: COMMITMENT_LEN,
        }
    }

    /// Check the descriptor against the implemented statement.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Unsupported`] naming the first field that
    /// differs from [`CircuitContract::sha256_packed`].
    pub fn validate(&self) -> Result<(), CircuitError> {
        let canonical = Self::sha256_packed();
        if self.name != canonical.name {
            return Err(CircuitError::Unsupported(format!(
                "unknown circuit \"{}\"",
                self.name
            )));
        }
        if self.version != canonical.version {
            return Err(CircuitError::Unsupported(format!(
                "version {} (this build implements version {CIRCUIT_VERSION})",
                self.version
            )));
        }
        if self.hash_input_chunks != HASH_INPUT_CHUNKS || self.chunk_bits != CHUNK_BITS {
            return Err(CircuitError::Unsupported(format!(
                "input layout {}x{} bits (expected {HASH_INPUT_CHUNKS}x{CHUNK_BITS})",
                self.hash_input_chunks, self.chunk_bits
            )));
        }
        if self.commitment_len != COMMITMENT_LEN {
            return Err(CircuitError::Unsupported(format!(
                "commitment length {} (expected {COMMITMENT_LEN})",
                self.commitment_len
            )));
        }
        Ok(())
    }
}

/// Input/output descriptor published to clients as `abi.json`.
///
/// Shaped like a ZoKrates ABI so existing client tooling can compute the
/// witness argument list from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abi {
    /// Contract identifier.
    pub circuit: String,
    /// Contract version.
    pub version: u32,
    /// Proving scheme tag.
    pub scheme: String,
    /// Curve name.
    pub curve: String,
    /// Circuit parameters, in argument order.
    pub inputs: Vec<AbiParam>,
    /// Circuit return values (none: the statement is an assertion).
    pub outputs: Vec<AbiParam>,
}

/// One ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    /// Parameter name.
    pub name: String,
    /// Whether the parameter is a public input.
    pub public: bool,
    /// Parameter kind (always `"array"` here).
    #[serde(rename = "type")]
    pub kind: String,
    /// Array element description.
    pub components: AbiComponents,
}

/// Array element description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiComponents {
    /// Array length.
    pub size: usize,
    /// Element kind (always `"field"`).
    #[serde(rename = "type")]
    pub element: String,
}

impl Abi {
    /// Describe `contract` for a given scheme and curve.
    pub fn for_contract(contract: &CircuitContract, scheme: &str, curve: &str) -> Self {
        let array = |name: &str, public: bool, size: usize| AbiParam {
            name: name.to_string(),
            public,
            kind: "array".to_string(),
            components: AbiComponents {
                size,
                element: "field".to_string(),
            },
        };
        Self {
            circuit: contract.name.clone(),
            version: contract.version,
            scheme: scheme.to_string(),
            curve: curve.to_string(),
            inputs: vec![
                array("hash_input", false, contract.hash_input_chunks),
                array("stored_hash", true, contract.commitment_len),
            ],
            outputs: Vec::new(),
        }
    }
}

/// A user secret, wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SecretTooLong`] for more than
    /// [`SECRET_BYTES`] bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ValidationError> {
        let mut bytes: Vec<u8> = bytes.into();
        if bytes.len() > SECRET_BYTES {
            let len = bytes.len();
            bytes.zeroize();
            return Err(ValidationError::SecretTooLong(len));
        }
        Ok(Self(bytes))
    }

    /// Build the client preimage `"<username>:<password>:<salt>"`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SecretTooLong`] if the preimage exceeds
    /// [`SECRET_BYTES`] bytes.
    pub fn from_credentials(
        username: &str,
        password: &str,
        salt: &str,
    ) -> Result<Self, ValidationError> {
        let preimage = Zeroizing::new(format!("{username}:{password}:{salt}"));
        Self::new(preimage.as_bytes().to_vec())
    }

    /// Number of secret bytes before padding.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.0.len())
    }
}

/// The four private 128-bit chunks of an encoded secret.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct HashInput([u128; HASH_INPUT_CHUNKS]);

impl HashInput {
    /// Build from raw chunks.
    pub fn from_chunks(chunks: [u128; HASH_INPUT_CHUNKS]) -> Self {
        Self(chunks)
    }

    /// The chunks, in argument order.
    pub fn chunks(&self) -> &[u128; HASH_INPUT_CHUNKS] {
        &self.0
    }

    /// The chunks as field elements (the client's witness arguments).
    pub fn to_field_elements(&self) -> [FieldElement; HASH_INPUT_CHUNKS] {
        self.0.map(FieldElement::from_u128)
    }

    /// Reassemble the 64-byte block the hash runs over.
    pub fn to_block(&self) -> Zeroizing<[u8; SECRET_BYTES]> {
        let mut block = Zeroizing::new([0u8; SECRET_BYTES]);
        for (i, chunk) in self.0.iter().enumerate() {
            block[i * CHUNK_BYTES..(i + 1) * CHUNK_BYTES].copy_from_slice(&chunk.to_be_bytes());
        }
        block
    }
}

impl std::fmt::Debug for HashInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashInput([REDACTED])")
    }
}

/// Encode a secret into the circuit's private input.
pub fn encode_secret(secret: &Secret) -> HashInput {
    let mut block = Zeroizing::new([0u8; SECRET_BYTES]);
    block[..secret.0.len()].copy_from_slice(&secret.0);
    let mut chunks = [0u128; HASH_INPUT_CHUNKS];
    for (i, chunk) in chunks.iter_mut().enumerate() {
        let mut buf = [0u8; CHUNK_BYTES];
        buf.copy_from_slice(&block[i * CHUNK_BYTES..(i + 1) * CHUNK_BYTES]);
        *chunk = u128::from_be_bytes(buf);
        buf.zeroize();
    }
    let input = HashInput(chunks);
    chunks.zeroize();
    input
}

/// Compute the commitment of an encoded secret.
pub fn commit(hash_input: &HashInput) -> Commitment {
    let block = hash_input.to_block();
    let digest = Sha256::digest(&block[..]);
    let mut hi = [0u8; CHUNK_BYTES];
    let mut lo = [0u8; CHUNK_BYTES];
    hi.copy_from_slice(&digest[..CHUNK_BYTES]);
    lo.copy_from_slice(&digest[CHUNK_BYTES..]);
    Commitment::new([
        FieldElement::from_u128(u128::from_be_bytes(hi)),
        FieldElement::from_u128(u128::from_be_bytes(lo)),
    ])
}

/// Private and public assignment for one proof.
#[derive(Debug, Clone)]
pub struct CommitmentWitness {
    /// Private input.
    pub hash_input: HashInput,
    /// Public input.
    pub commitment: Commitment,
}

impl CommitmentWitness {
    /// Pair a private input with the commitment it is claimed to open.
    ///
    /// No consistency check is made; proving an inconsistent witness fails.
    pub fn new(hash_input: HashInput, commitment: Commitment) -> Self {
        Self {
            hash_input,
            commitment,
        }
    }

    /// Build the honest witness for a secret.
    pub fn from_secret(secret: &Secret) -> Self {
        let hash_input = encode_secret(secret);
        let commitment = commit(&hash_input);
        Self {
            hash_input,
            commitment,
        }
    }

    /// Whether the private input hashes to the public commitment.
    pub fn is_consistent(&self) -> bool {
        commit(&self.hash_input).ct_eq(&self.commitment)
    }
}

#[cfg(feature = "groth16")]
pub use self::r1cs::CommitmentCircuit;
#[cfg(feature = "groth16")]
pub(crate) use self::r1cs::to_field;

#[cfg(feature = "groth16")]
mod r1cs {
    use ark_crypto_primitives::crh::sha256::constraints::Sha256Gadget;
    use ark_ff::PrimeField;
    use ark_r1cs_std::prelude::*;
    use ark_r1cs_std::fields::fp::FpVar;
    use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
    use zkauth_core::{FieldElement, COMMITMENT_LEN};

    use super::{CommitmentWitness, CHUNK_BITS, CHUNK_BYTES, HASH_INPUT_CHUNKS};

    /// R1CS synthesizer for the commitment statement.
    ///
    /// Public inputs are allocated in order `stored_hash[0]`,
    /// `stored_hash[1]`; verifiers must pass them in that order.
    #[derive(Clone)]
    pub struct CommitmentCircuit<F: PrimeField> {
        hash_input: Option<[u128; HASH_INPUT_CHUNKS]>,
        stored_hash: Option<[F; COMMITMENT_LEN]>,
    }

    impl<F: PrimeField> CommitmentCircuit<F> {
        /// Circuit with no assignment, for compilation and setup.
        pub fn blank() -> Self {
            Self {
                hash_input: None,
                stored_hash: None,
            }
        }

        /// Circuit assigned from a witness, for proving.
        pub fn assigned(witness: &CommitmentWitness) -> Self {
            let [c0, c1] = witness.commitment.elements();
            Self {
                hash_input: Some(*witness.hash_input.chunks()),
                stored_hash: Some([to_field(c0), to_field(c1)]),
            }
        }
    }

    /// Map a range-checked element into the proving field.
    pub(crate) fn to_field<F: PrimeField>(element: &FieldElement) -> F {
        F::from_be_bytes_mod_order(&element.to_be_bytes())
    }

    impl<F: PrimeField> ConstraintSynthesizer<F> for CommitmentCircuit<F> {
        fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
            let mut stored_hash = Vec::with_capacity(COMMITMENT_LEN);
            for i in 0..COMMITMENT_LEN {
                stored_hash.push(FpVar::new_input(cs.clone(), || {
                    self.stored_hash
                        .map(|h| h[i])
                        .ok_or(SynthesisError::AssignmentMissing)
                })?);
            }

            let mut block = Vec::with_capacity(HASH_INPUT_CHUNKS * CHUNK_BYTES);
            for i in 0..HASH_INPUT_CHUNKS {
                let chunk = FpVar::new_witness(cs.clone(), || {
                    self.hash_input
                        .map(|c| F::from(c[i]))
                        .ok_or(SynthesisError::AssignmentMissing)
                })?;
                let bits = chunk.to_bits_le()?;
                // Range check: everything above bit 127 is zero.
                for bit in &bits[CHUNK_BITS..] {
                    bit.enforce_equal(&Boolean::FALSE)?;
                }
                // Big-endian byte order inside the chunk.
                for j in (0..CHUNK_BYTES).rev() {
                    block.push(UInt8::from_bits_le(&bits[j * 8..(j + 1) * 8]));
                }
            }

            let digest = Sha256Gadget::<F>::digest(&block)?;
            for (half, expected) in digest.0.chunks(CHUNK_BYTES).zip(&stored_hash) {
                let mut bits = Vec::with_capacity(CHUNK_BITS);
                for byte in half.iter().rev() {
                    bits.extend(byte.to_bits_le()?);
                }
                let packed = Boolean::le_bits_to_fp_var(&bits)?;
                packed.enforce_equal(expected)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    #[test]
    fn canonical_contract_validates() {
        assert!(CircuitContract::sha256_packed().validate().is_ok());
    }

    #[test]
    fn modified_contract_rejected() {
        let mut c = CircuitContract::sha256_packed();
        c.version = CIRCUIT_VERSION + 1;
        assert!(matches!(c.validate(), Err(CircuitError::Unsupported(_))));

        let mut c = CircuitContract::sha256_packed();
        c.hash_input_chunks = 2;
        assert!(c.validate().is_err());

        let mut c = CircuitContract::sha256_packed();
        c.commitment_len = 3;
        assert!(c.validate().is_err());

        let mut c = CircuitContract::sha256_packed();
        c.name = "poseidon".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn encoding_pads_and_splits_big_endian() {
        let secret = Secret::new(b"ab".to_vec()).unwrap();
        let input = encode_secret(&secret);
        let expected_first = u128::from_be_bytes({
            let mut b = [0u8; 16];
            b[0] = b'a';
            b[1] = b'b';
            b
        });
        assert_eq!(input.chunks(), &[expected_first, 0, 0, 0]);
    }

    #[test]
    fn full_block_uses_every_chunk() {
        let bytes: Vec<u8> = (1..=64).collect();
        let input = encode_secret(&Secret::new(bytes.clone()).unwrap());
        assert_eq!(&input.to_block()[..], &bytes[..]);
        assert_eq!(input.chunks()[3] & 0xff, 64);
    }

    #[test]
    fn overlong_secret_rejected() {
        let err = Secret::new(vec![7u8; 65]).unwrap_err();
        assert_eq!(err, ValidationError::SecretTooLong(65));
        assert!(Secret::new(vec![7u8; 64]).is_ok());
    }

    #[test]
    fn commitment_is_sha256_of_padded_block() {
        let secret = Secret::new(b"alice:hunter2:salt".to_vec()).unwrap();
        let mut block = [0u8; 64];
        block[..18].copy_from_slice(b"alice:hunter2:salt");
        let digest_hex = sha256_hex(&block);

        let c = commit(&encode_secret(&secret));
        let hi = u128::from_str_radix(&digest_hex[..32], 16).unwrap();
        let lo = u128::from_str_radix(&digest_hex[32..], 16).unwrap();
        assert_eq!(c.elements()[0], FieldElement::from_u128(hi));
        assert_eq!(c.elements()[1], FieldElement::from_u128(lo));
    }

    #[test]
    fn empty_secret_commits_to_zero_block_hash() {
        let c = commit(&encode_secret(&Secret::new(Vec::new()).unwrap()));
        let digest_hex = sha256_hex(&[0u8; 64]);
        let hi = u128::from_str_radix(&digest_hex[..32], 16).unwrap();
        assert_eq!(c.elements()[0], FieldElement::from_u128(hi));
    }

    #[test]
    fn credentials_preimage_convention() {
        let a = Secret::from_credentials("alice", "pw", "s").unwrap();
        let b = Secret::new(b"alice:pw:s".to_vec()).unwrap();
        assert_eq!(
            commit(&encode_secret(&a)),
            commit(&encode_secret(&b))
        );
        assert!(Secret::from_credentials("alice", &"x".repeat(60), "s").is_err());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let s = Secret::new(b"topsecret".to_vec()).unwrap();
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("topsecret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn witness_consistency() {
        let secret = Secret::new(b"pw".to_vec()).unwrap();
        let honest = CommitmentWitness::from_secret(&secret);
        assert!(honest.is_consistent());

        let other = CommitmentWitness::from_secret(&Secret::new(b"other".to_vec()).unwrap());
        let forged = CommitmentWitness::new(honest.hash_input.clone(), other.commitment);
        assert!(!forged.is_consistent());
    }

    #[test]
    fn abi_lists_private_then_public() {
        let abi = Abi::for_contract(&CircuitContract::sha256_packed(), "g16", "bn254");
        assert_eq!(abi.inputs.len(), 2);
        assert_eq!(abi.inputs[0].name, "hash_input");
        assert!(!abi.inputs[0].public);
        assert_eq!(abi.inputs[0].components.size, 4);
        assert_eq!(abi.inputs[1].name, "stored_hash");
        assert!(abi.inputs[1].public);
        let json = serde_json::to_value(&abi).unwrap();
        assert_eq!(json["inputs"][1]["type"], "array");
        assert_eq!(json["inputs"][1]["components"]["type"], "field");
    }

    proptest! {
        #[test]
        fn block_roundtrips_through_chunks(bytes in proptest::collection::vec(any::<u8>(), 0..=64)) {
            let input = encode_secret(&Secret::new(bytes.clone()).unwrap());
            let block = input.to_block();
            prop_assert_eq!(&block[..bytes.len()], &bytes[..]);
            prop_assert!(block[bytes.len()..].iter().all(|b| *b == 0));
        }

        #[test]
        fn commitment_elements_fit_128_bits(bytes in proptest::collection::vec(any::<u8>(), 0..=64)) {
            let c = commit(&encode_secret(&Secret::new(bytes).unwrap()));
            for e in c.elements() {
                prop_assert!(e.as_biguint().bits() <= 128);
            }
        }
    }

    #[cfg(feature = "groth16")]
    mod constraints {
        use super::*;
        use ark_bn254::Fr;
        use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};

        fn satisfied(witness: &CommitmentWitness) -> bool {
            let cs = ConstraintSystem::<Fr>::new_ref();
            CommitmentCircuit::<Fr>::assigned(witness)
                .generate_constraints(cs.clone())
                .unwrap();
            cs.is_satisfied().unwrap()
        }

        #[test]
        fn honest_witness_satisfies_circuit() {
            let secret = Secret::from_credentials("alice", "hunter2", "salt").unwrap();
            assert!(satisfied(&CommitmentWitness::from_secret(&secret)));
        }

        #[test]
        fn mismatched_commitment_unsatisfied() {
            let a = CommitmentWitness::from_secret(&Secret::new(b"a".to_vec()).unwrap());
            let b = CommitmentWitness::from_secret(&Secret::new(b"b".to_vec()).unwrap());
            let forged = CommitmentWitness::new(a.hash_input.clone(), b.commitment);
            assert!(!satisfied(&forged));
        }

        #[test]
        fn two_public_inputs_allocated() {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let secret = Secret::new(b"x".to_vec()).unwrap();
            CommitmentCircuit::<Fr>::assigned(&CommitmentWitness::from_secret(&secret))
                .generate_constraints(cs.clone())
                .unwrap();
            // One for the constant term plus the two commitment elements.
            assert_eq!(cs.num_instance_variables(), 3);
        }
    }
}
