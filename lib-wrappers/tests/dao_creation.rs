//! End-to-end DAO creation flows against the scripted chain client.

use lib_chain::testing::MockChain;
use lib_chain::{ArtifactRegistry, TxLifecycle, TxLifecycleEvent, Value};
use lib_types::{Address, Amount, Hash, SchemePermissions};
use lib_wrappers::{
    DaoCreatorWrapper, DaoVotingMachineConfig, Founder, ForgeOrgOptions, SchemeConfig, SchemeKind,
    SetSchemesOptions, WrapperRegistry,
};
use serde_json::json;
use std::sync::Arc;

const CREATOR: Address = Address([0xc0; 20]);
const CONTROLLER: Address = Address([0xcc; 20]);
const AVATAR: Address = Address([0xaa; 20]);
const REPUTATION: Address = Address([0xee; 20]);
const MACHINE: Address = Address([0x1a; 20]);
const REGISTRAR: Address = Address([0x2a; 20]);
const REWARDS: Address = Address([0x2b; 20]);

fn creator_with_catalog(chain: Arc<MockChain>) -> DaoCreatorWrapper {
    let mut artifacts = ArtifactRegistry::new();
    artifacts.register("UController", CONTROLLER);

    let mut registry = WrapperRegistry::new(chain.clone());
    registry.register_voting_machine("AbsoluteVote", Some(MACHINE));
    registry.register_scheme(
        "SchemeRegistrar",
        SchemeKind::Universal,
        SchemePermissions::REGISTERED | SchemePermissions::CAN_REGISTER_SCHEMES,
        Some(REGISTRAR),
    );
    registry.register_scheme(
        "ContributionReward",
        SchemeKind::Universal,
        SchemePermissions::REGISTERED,
        Some(REWARDS),
    );

    DaoCreatorWrapper::new(
        CREATOR,
        chain,
        artifacts,
        Arc::new(registry),
        TxLifecycle::new(),
        Some("AbsoluteVote".to_string()),
    )
}

fn stub_scheme_reads(chain: &MockChain) {
    chain.stub_call(AVATAR, "nativeReputation", vec![Value::Address(REPUTATION)]);
    chain.stub_call(
        MACHINE,
        "getParametersHash",
        vec![Value::Hash(Hash::new([0x11; 32]))],
    );
    chain.stub_call(
        REGISTRAR,
        "getParametersHash",
        vec![Value::Hash(Hash::new([0xa1; 32]))],
    );
    chain.stub_call(
        REWARDS,
        "getParametersHash",
        vec![Value::Hash(Hash::new([0xb1; 32]))],
    );
}

fn scheme(name: &str) -> SchemeConfig {
    SchemeConfig {
        name: name.to_string(),
        address: None,
        permissions: SchemePermissions::NONE,
        voting_machine_params: None,
    }
}

#[tokio::test]
async fn test_forge_org_returns_a_nonempty_avatar() {
    let chain = Arc::new(MockChain::new());
    let creator = creator_with_catalog(chain.clone());
    chain.stub_receipt_event("forgeOrg", "NewOrg", json!({ "_avatar": AVATAR }));

    let result = creator
        .forge_org(&ForgeOrgOptions {
            name: "X".to_string(),
            token_name: "T".to_string(),
            token_symbol: "TST".to_string(),
            founders: vec![Founder {
                address: Address::new([0x0a; 20]),
                tokens: Amount::ZERO,
                reputation: Amount::new(100),
            }],
            token_cap: Amount::ZERO,
            universal_controller: true,
        })
        .await
        .unwrap();

    assert!(!result.avatar.is_zero());
    assert_eq!(result.avatar, AVATAR);
}

#[tokio::test]
async fn test_set_schemes_without_avatar_issues_no_transaction() {
    let chain = Arc::new(MockChain::new());
    let creator = creator_with_catalog(chain.clone());

    let err = creator
        .set_schemes(&SetSchemesOptions {
            avatar: Address::ZERO,
            schemes: vec![],
            voting_machine_params: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "avatar address is not defined");
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn test_shared_parameter_hash_is_registered_once() {
    let chain = Arc::new(MockChain::new());
    let creator = creator_with_catalog(chain.clone());
    stub_scheme_reads(&chain);

    creator
        .set_schemes(&SetSchemesOptions {
            avatar: AVATAR,
            schemes: vec![scheme("SchemeRegistrar"), scheme("ContributionReward")],
            voting_machine_params: None,
        })
        .await
        .unwrap();

    // both schemes resolve to the same machine and parameter hash
    let registrations: Vec<_> = chain
        .sent()
        .into_iter()
        .filter(|tx| tx.to == MACHINE && tx.method == "setParameters")
        .collect();
    assert_eq!(registrations.len(), 1);
}

#[tokio::test]
async fn test_transaction_count_formula() {
    let chain = Arc::new(MockChain::new());
    let creator = creator_with_catalog(chain);

    let mut with_own_params = scheme("SchemeRegistrar");
    with_own_params.voting_machine_params = Some(DaoVotingMachineConfig::default());

    let empty = SetSchemesOptions {
        avatar: AVATAR,
        schemes: vec![],
        voting_machine_params: None,
    };
    assert_eq!(creator.set_schemes_transactions_count(&empty), 2);

    let mixed = SetSchemesOptions {
        avatar: AVATAR,
        schemes: vec![scheme("ContributionReward"), with_own_params],
        voting_machine_params: None,
    };
    assert_eq!(creator.set_schemes_transactions_count(&mixed), 5);
}

#[tokio::test]
async fn test_registered_permissions_contain_the_required_set() {
    let chain = Arc::new(MockChain::new());
    let creator = creator_with_catalog(chain.clone());
    stub_scheme_reads(&chain);

    let mut config = scheme("SchemeRegistrar");
    config.permissions = SchemePermissions::CAN_CALL_DELEGATECALL;
    creator
        .set_schemes(&SetSchemesOptions {
            avatar: AVATAR,
            schemes: vec![config],
            voting_machine_params: None,
        })
        .await
        .unwrap();

    let sent = chain.sent();
    let last = sent.last().unwrap();
    let Value::StrList(masks) = &last.args[3] else {
        panic!("expected permission list, got {:?}", last.args[3]);
    };
    let registered: SchemePermissions = masks[0].parse().unwrap();
    let required = SchemePermissions::REGISTERED | SchemePermissions::CAN_REGISTER_SCHEMES;
    assert!(registered.contains(required));
    assert!(registered.contains(SchemePermissions::CAN_CALL_DELEGATECALL));
}

#[tokio::test]
async fn test_set_schemes_lifecycle_sequence() {
    let chain = Arc::new(MockChain::new());
    let creator = creator_with_catalog(chain.clone());
    stub_scheme_reads(&chain);
    let mut feed = creator.lifecycle().subscribe();

    creator
        .set_schemes(&SetSchemesOptions {
            avatar: AVATAR,
            schemes: vec![scheme("SchemeRegistrar")],
            voting_machine_params: None,
        })
        .await
        .unwrap();

    match feed.recv().await.unwrap() {
        TxLifecycleEvent::Kickoff {
            function, tx_count, ..
        } => {
            assert_eq!(function, "setSchemes");
            assert_eq!(tx_count, 3);
        }
        other => panic!("expected kickoff, got {other:?}"),
    }

    // machine params, scheme params, then the final registration
    let mut mined = 0;
    loop {
        match feed.recv().await.unwrap() {
            TxLifecycleEvent::TxMined { .. } => mined += 1,
            TxLifecycleEvent::Completed { .. } => break,
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(mined, 3);
}

#[tokio::test]
async fn test_forge_then_set_schemes_full_flow() {
    let chain = Arc::new(MockChain::new());
    let creator = creator_with_catalog(chain.clone());
    chain.stub_receipt_event("forgeOrg", "NewOrg", json!({ "_avatar": AVATAR }));
    chain.stub_receipt_event("setSchemes", "InitialSchemesSet", json!({ "_avatar": AVATAR }));
    stub_scheme_reads(&chain);

    let forged = creator
        .forge_org(&ForgeOrgOptions {
            name: "Agora".to_string(),
            token_name: "Agora Token".to_string(),
            token_symbol: "AGT".to_string(),
            founders: vec![Founder {
                address: Address::new([0x0a; 20]),
                tokens: Amount::new(1000),
                reputation: Amount::new(100),
            }],
            token_cap: Amount::ZERO,
            universal_controller: true,
        })
        .await
        .unwrap();

    let receipt = creator
        .set_schemes(&SetSchemesOptions {
            avatar: forged.avatar,
            schemes: vec![scheme("SchemeRegistrar"), scheme("ContributionReward")],
            voting_machine_params: None,
        })
        .await
        .unwrap();

    assert!(receipt.event("InitialSchemesSet").is_some());

    let sent = chain.sent();
    let last = sent.last().unwrap();
    assert_eq!(last.method, "setSchemes");
    assert_eq!(last.args[0], Value::Address(forged.avatar));
    assert_eq!(last.args[1], Value::AddressList(vec![REGISTRAR, REWARDS]));

    let installed = creator.initial_schemes_set().get(0).await.unwrap();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].args.avatar, AVATAR);
}
