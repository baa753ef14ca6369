//! Lookup protocol behavior over small populations.

use kadsim::{Error, Id, Network};

/// Join every non-bootstrap participant: each looks up its own id against
/// the bootstrap contact alone.
fn join_all(network: &Network, addresses: &[&str], bootstrap: &str) {
    let bootstrap = vec![bootstrap.to_string()];

    for address in addresses {
        if *address == bootstrap[0] {
            continue;
        }
        let target = *network.contact(address).expect("known participant").id();
        network
            .run_lookup(address, target, &bootstrap)
            .expect("known querier");
    }
}

#[test]
fn everyone_knows_the_bootstrap_after_joining() {
    let addresses = ["x", "y", "z"];
    let network = Network::new(addresses).expect("non-empty");

    join_all(&network, &addresses, "x");

    for address in ["y", "z"] {
        let table = network.table_snapshot(address).expect("known participant");
        assert!(
            table.contacts().any(|contact| contact.address() == "x"),
            "{address} does not know the bootstrap"
        );
    }

    // The bootstrap learned of both joiners in return.
    let table = network.table_snapshot("x").expect("known participant");
    assert!(table.contacts().any(|contact| contact.address() == "y"));
    assert!(table.contacts().any(|contact| contact.address() == "z"));
}

#[test]
fn lookup_of_a_participants_own_id_finds_it() {
    let addresses: Vec<String> = (0..6).map(|i| format!("node-{i}")).collect();
    let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();
    let network = Network::new(addresses.clone()).expect("non-empty");

    join_all(&network, &refs, "node-0");

    let target = *network.contact("node-5").expect("known").id();
    let outcome = network
        .run_lookup("node-3", target, &["node-0".to_string()])
        .expect("known querier");

    assert!(outcome.addresses().any(|address| address == "node-5"));

    // The target's own id is the closest possible, so it converges first.
    assert_eq!(outcome.contacts()[0].address(), "node-5");
}

#[test]
fn repeated_lookup_is_deterministic() {
    let addresses: Vec<String> = (0..6).map(|i| format!("node-{i}")).collect();
    let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();
    let network = Network::new(addresses.clone()).expect("non-empty");

    join_all(&network, &refs, "node-0");

    let target = Id::from_address("some arbitrary target");
    let bootstrap = vec!["node-0".to_string()];

    let first: Vec<String> = network
        .run_lookup("node-2", target, &bootstrap)
        .expect("known querier")
        .addresses()
        .map(String::from)
        .collect();
    let second: Vec<String> = network
        .run_lookup("node-2", target, &bootstrap)
        .expect("known querier")
        .addresses()
        .map(String::from)
        .collect();

    assert_eq!(first, second);
}

#[test]
fn disconnected_participant_converges_to_nothing() {
    let network = Network::new(["loner", "other"]).expect("non-empty");

    let outcome = network
        .run_lookup("loner", Id::from_address("anything"), &[])
        .expect("known querier");

    assert!(outcome.is_empty());
    assert!(outcome.edges().is_empty());
    assert_eq!(network.table_size("loner"), Some(0));
}

#[test]
fn freshly_joined_participant_is_discoverable() {
    let network = Network::new(["alpha", "bravo", "charlie"]).expect("non-empty");
    let bootstrap = vec!["charlie".to_string()];

    // In a fresh network no table knows "bravo"; it becomes discoverable
    // only once its own join has told the bootstrap about it.
    let target = *network.contact("bravo").expect("known").id();
    network
        .run_lookup("bravo", target, &bootstrap)
        .expect("known querier");

    let outcome = network
        .run_lookup("alpha", target, &bootstrap)
        .expect("known querier");

    assert!(outcome.addresses().any(|address| address == "bravo"));
}

#[test]
fn unknown_querier_is_rejected() {
    let network = Network::new(["alpha"]).expect("non-empty");

    let result = network.run_lookup("ghost", Id::from_address("anything"), &[]);

    assert_eq!(
        result.err(),
        Some(Error::UnknownParticipant("ghost".to_string()))
    );
}

#[test]
fn query_edges_fan_out_from_the_querier() {
    let addresses = ["x", "y", "z"];
    let network = Network::new(addresses).expect("non-empty");

    let target = *network.contact("y").expect("known").id();
    let outcome = network
        .run_lookup("y", target, &["x".to_string()])
        .expect("known querier");

    assert!(!outcome.edges().is_empty());
    assert_eq!(outcome.edges()[0].to.address(), "x");
    for edge in outcome.edges() {
        assert_eq!(edge.from.address(), "y");
    }
}

#[test]
fn lookup_results_are_closest_first() {
    let addresses: Vec<String> = (0..10).map(|i| format!("node-{i}")).collect();
    let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();
    let network = Network::new(addresses.clone()).expect("non-empty");

    join_all(&network, &refs, "node-0");

    let target = Id::from_address("another target");
    let outcome = network
        .run_lookup("node-4", target, &["node-0".to_string()])
        .expect("known querier");

    let distances: Vec<_> = outcome
        .contacts()
        .iter()
        .map(|contact| contact.id().xor(&target))
        .collect();
    let mut sorted = distances.clone();
    sorted.sort();
    assert_eq!(distances, sorted);
}
