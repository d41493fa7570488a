//! # Groth16 Engine Round Trip
//!
//! Registration and login through a real BN254 bundle: the proof crosses
//! the JSON boundary exactly as a client sends it, and a proof for a
//! different statement is rejected even though the claim matches.
//!
//! One setup for the SHA-256 circuit takes seconds, so the whole flow runs
//! in a single test.

use std::sync::Arc;

use zkauth_auth::{
    AuthEngine, AuthError, LoginRequest, LoginTimings, MemoryStore, RegisterRequest,
    RegisterTimings,
};
use zkauth_core::PublicInputs;
use zkauth_zkp::{
    BundleVerifier, CircuitContract, CommitmentWitness, Groth16Proof, Groth16ProofSystem,
    ProofSystem, Secret,
};

fn witness(password: &str) -> CommitmentWitness {
    CommitmentWitness::from_secret(&Secret::from_credentials("alice", password, "salt").unwrap())
}

fn login_req(proof: serde_json::Value, witness: &CommitmentWitness) -> LoginRequest {
    LoginRequest::parse(
        "alice",
        proof,
        PublicInputs::from(&witness.commitment),
        LoginTimings::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn groth16_register_login_and_reject_tampered() {
    let system = Groth16ProofSystem;
    let program = system.compile(&CircuitContract::sha256_packed()).unwrap();
    let (pk, vk) = system.setup(&program).unwrap();
    let engine = AuthEngine::new(MemoryStore::new(), Arc::new(BundleVerifier::new(system, vk)));

    let alice = witness("correct horse");
    engine
        .register(
            RegisterRequest::parse(
                "alice",
                &alice.commitment.to_strings(),
                RegisterTimings::default(),
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let proof = system.prove(&pk, &alice).unwrap();
    let proof_json = serde_json::to_value(&proof).unwrap();
    let outcome = engine.login(login_req(proof_json, &alice)).await.unwrap();
    assert_eq!(outcome.welcome_message(), "Welcome back, alice");

    // Valid encoding, wrong statement: proves a different password's commitment.
    let other = system.prove(&pk, &witness("wrong horse")).unwrap();
    let err = engine
        .login(login_req(serde_json::to_value(&other).unwrap(), &alice))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Verification));

    // Flip one byte of the genuine proof.
    let mut bytes = hex::decode(&proof.proof).unwrap();
    bytes[10] ^= 0x01;
    let tampered = Groth16Proof {
        proof: hex::encode(bytes),
        ..proof
    };
    let err = engine
        .login(login_req(serde_json::to_value(&tampered).unwrap(), &alice))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Verification));
}
