use super::support::*;

#[test]
fn nested_fields_resolve_through_the_source_graph() {
    let mapper = Mapper::default();
    let plan = mapper.plan::<Customer, CustomerRow>("");

    assert_eq!(forward_path(&plan, "id").as_deref(), Some("id"));
    assert_eq!(forward_path(&plan, "name").as_deref(), Some("name"));
    assert_eq!(forward_path(&plan, "city").as_deref(), Some("address.city"));
    assert_eq!(forward_path(&plan, "country").as_deref(), Some("address.country.name"));
    assert_eq!(forward_path(&plan, "note"), None);
}

#[test]
fn every_writable_field_appears_exactly_once() {
    let mapper = Mapper::default();
    let plan = mapper.plan::<Customer, CustomerRow>("admin");

    let forward: Vec<_> = plan.forward.entries.iter().map(|entry| entry.target.name).collect();
    assert_eq!(forward, vec!["id", "name", "email", "city", "country", "note"]);
    assert!(plan.forward.entry("cached").is_none());

    let backward: Vec<_> = plan.backward.entries.iter().map(|entry| entry.target.name).collect();
    assert_eq!(backward, vec!["id", "name", "email", "address", "joined"]);
}

#[test]
fn tags_partition_annotations() {
    let mapper = Mapper::default();

    let plain = mapper.plan::<Customer, CustomerRow>("");
    assert_eq!(forward_path(&plain, "email"), None);
    assert_eq!(backward_path(&plain, "email"), None);

    let admin = mapper.plan::<Customer, CustomerRow>("admin");
    assert_eq!(forward_path(&admin, "email").as_deref(), Some("email"));
    assert_eq!(backward_path(&admin, "email").as_deref(), Some("email"));

    let unknown = mapper.plan::<Customer, CustomerRow>("no-such-tag");
    assert_eq!(forward_path(&unknown, "email"), None);
    assert_eq!(forward_path(&unknown, "name").as_deref(), Some("name"));
}

#[test]
fn multi_tag_annotations_bind_under_each_listed_tag() {
    let mapper = Mapper::default();

    for tag in ["a", "b"] {
        let plan = mapper.plan::<Customer, AuditRow>(tag);
        assert_eq!(forward_path(&plan, "email").as_deref(), Some("email"), "tag {tag:?}");
        assert_eq!(backward_path(&plan, "email").as_deref(), Some("email"), "tag {tag:?}");
    }
    for tag in ["c", ""] {
        let plan = mapper.plan::<Customer, AuditRow>(tag);
        assert_eq!(forward_path(&plan, "email"), None, "tag {tag:?}");
        assert_eq!(backward_path(&plan, "email"), None, "tag {tag:?}");
        assert_eq!(forward_path(&plan, "name").as_deref(), Some("name"));
    }

    let row = mapper.materialize::<Customer, AuditRow>(&linz(), "b").unwrap().unwrap();
    assert_eq!(row.email, "ada@example.com");
    let row = mapper.materialize::<Customer, AuditRow>(&linz(), "c").unwrap().unwrap();
    assert_eq!(row.email, "");
}

#[test]
fn enum_fields_bind_as_whole_values() {
    let mapper = Mapper::default();
    let plan = mapper.plan::<Order, OrderRow>("");

    assert_eq!(forward_path(&plan, "status").as_deref(), Some("status"));
    assert_eq!(forward_path(&plan, "city").as_deref(), Some("address.city"));
    assert_eq!(backward_path(&plan, "status").as_deref(), Some("status"));
    assert!(Status::shape().fields.is_empty());
}

#[test]
fn backward_plan_is_one_level_deep() {
    let mapper = Mapper::default();
    let plan = mapper.plan::<Customer, CustomerRow>("");

    assert_eq!(backward_path(&plan, "id").as_deref(), Some("id"));
    assert_eq!(backward_path(&plan, "name").as_deref(), Some("name"));
    assert_eq!(backward_path(&plan, "address"), None);
    assert_eq!(backward_path(&plan, "joined"), None);
}

#[test]
fn qualifier_specific_annotation_wins() {
    let mapper = Mapper::default();

    let product = mapper.plan::<Product, Label>("");
    assert_eq!(forward_path(&product, "name").as_deref(), Some("name"));
    assert_eq!(backward_path(&product, "name").as_deref(), Some("name"));

    let vendor = mapper.plan::<Vendor, Label>("");
    assert_eq!(forward_path(&vendor, "name"), None);

    let vendor_admin = mapper.plan::<Vendor, Label>("admin");
    assert_eq!(forward_path(&vendor_admin, "name").as_deref(), Some("name"));
}

#[test]
fn read_only_flags_disable_one_direction() {
    let mapper = Mapper::default();
    let plan = mapper.plan::<Account, AccountView>("");

    assert_eq!(forward_path(&plan, "login"), None);
    assert_eq!(forward_path(&plan, "balance").as_deref(), Some("balance"));
    assert_eq!(backward_path(&plan, "login").as_deref(), Some("login"));
    assert_eq!(backward_path(&plan, "balance"), None);
}

#[test]
fn cyclic_graphs_resolve_in_bounded_time() {
    init_logging();
    let mapper = Mapper::default();
    let plan = mapper.plan::<Node, NodeRow>("");

    assert_eq!(forward_path(&plan, "name").as_deref(), Some("name"));
    assert_eq!(forward_path(&plan, "label").as_deref(), Some("peer.label"));
    assert_eq!(forward_path(&plan, "missing"), None);

    let levels: Vec<_> = plan.levels.iter().map(|level| level.key.short_name()).collect();
    assert_eq!(levels, vec!["Node", "Peer"]);
}

#[test]
fn max_depth_bounds_access_paths() {
    let shallow = Mapper::new(MapperConfig {
        max_depth: 2,
        ..MapperConfig::default()
    });
    let plan = shallow.plan::<Customer, CustomerRow>("");

    assert_eq!(forward_path(&plan, "city").as_deref(), Some("address.city"));
    assert_eq!(forward_path(&plan, "country"), None);
}

#[test]
fn exclude_policy_stops_at_tag_mismatch() {
    let mapper = Mapper::default();
    let plan = mapper.plan::<Customer, ContactRow>("");
    assert_eq!(forward_path(&plan, "contact"), None);
}

#[test]
fn continue_policy_keeps_searching() {
    let mapper = Mapper::new(MapperConfig {
        tag_mismatch: TagMismatch::Continue,
        ..MapperConfig::default()
    });

    let plain = mapper.plan::<Customer, ContactRow>("");
    assert_eq!(forward_path(&plain, "contact").as_deref(), Some("address.city"));

    let admin = mapper.plan::<Customer, ContactRow>("admin");
    assert_eq!(forward_path(&admin, "contact").as_deref(), Some("email"));
}

#[test]
fn plans_can_be_looked_up_by_registered_name() {
    let mapper = Mapper::default();
    let plan = mapper.plan_by_name("Customer", "CustomerRow", "").unwrap();
    assert_eq!(forward_path(&plan, "city").as_deref(), Some("address.city"));
    assert!(mapper.plan_by_name("Customer", "NotAType", "").is_none());
}
