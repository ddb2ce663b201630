use std::time::Duration;

use packer_teamcity::{
    api::teamcity::{Profile, DEFAULT_TIMEOUT},
    config::{self, missing_fields, Field, Mode},
};
use proptest::prelude::*;
use serde_yaml::Value;
use test_strategy::proptest;

use crate::helper::{bundle, cloud_image_bundle, custom_image_bundle, set_vars};

const CLOUD_IMAGE_FIELDS: [Field; 4] = [
    Field::Username,
    Field::Password,
    Field::ProjectId,
    Field::CloudImage,
];

const CUSTOM_IMAGE_FIELDS: [Field; 5] = [
    Field::Username,
    Field::Password,
    Field::ProjectId,
    Field::CustomImageName,
    Field::AgentName,
];

fn with_blank(base: Value, field: Field) -> Value {
    let Value::Mapping(mut mapping) = base else { panic!("bundle must be a mapping") };
    mapping.insert(Value::from(field.to_string()), Value::from(""));
    Value::Mapping(mapping)
}

#[proptest]
fn no_server_requires_nothing(
    #[strategy(r#"\PC*"#)] username: String,
    #[strategy(r#"\PC*"#)] password: String,
    #[strategy(r#"\PC*"#)] project_id: String,
    #[strategy(r#"\PC*"#)] cloud_image: String,
    #[strategy(r#"\PC*"#)] custom_image_name: String,
    #[strategy(r#"\PC*"#)] agent_name: String,
) {
    let raw = bundle(&[
        ("teamcity_url", ""),
        ("username", username.as_str()),
        ("password", password.as_str()),
        ("project_id", project_id.as_str()),
        ("cloud_image", cloud_image.as_str()),
        ("custom_image_name", custom_image_name.as_str()),
        ("agent_name", agent_name.as_str()),
    ]);

    match config::decode([raw]) {
        Ok(conf) => prop_assert_eq!(conf.teamcity(), &None),
        Err(err) => prop_assert!(false, "unexpected validation error: {:#}", err),
    }
}

#[proptest]
fn cloud_image_single_blank_field(#[strategy(0..CLOUD_IMAGE_FIELDS.len())] index: usize) {
    let field = CLOUD_IMAGE_FIELDS[index];
    let raw = with_blank(cloud_image_bundle("https://teamcity.example.com"), field);

    let err = config::decode([raw]).expect_err("must have failed validation");
    prop_assert_eq!(missing_fields(&err), vec![field]);
}

#[proptest]
fn custom_image_single_blank_field(#[strategy(0..CUSTOM_IMAGE_FIELDS.len())] index: usize) {
    let field = CUSTOM_IMAGE_FIELDS[index];
    let raw = with_blank(custom_image_bundle("https://teamcity.example.com"), field);

    let err = config::decode([raw]).expect_err("must have failed validation");
    prop_assert_eq!(missing_fields(&err), vec![field]);
}

#[test]
fn cloud_image_reports_every_missing_field() {
    set_vars!();
    let raw = bundle(&[("teamcity_url", "https://teamcity.example.com")]);

    let err = config::decode([raw]).expect_err("must have failed validation");
    assert_eq!(missing_fields(&err), CLOUD_IMAGE_FIELDS.to_vec());

    let rendered = format!("{err:?}");
    for field in CLOUD_IMAGE_FIELDS {
        let message = format!("{field} is required");
        assert!(rendered.contains(&message), "must mention '{message}': {rendered}");
    }
}

#[test]
fn custom_image_reports_every_missing_field() {
    // Custom image mode is selected by either of its fields.
    let raw = bundle(&[
        ("teamcity_url", "https://teamcity.example.com"),
        ("agent_name", "agent-7"),
    ]);

    let err = config::decode([raw]).expect_err("must have failed validation");
    assert_eq!(
        missing_fields(&err),
        vec![
            Field::Username,
            Field::Password,
            Field::ProjectId,
            Field::CustomImageName,
        ]
    );
}

#[test]
fn cloud_image_values() {
    let conf = config::decode([cloud_image_bundle("https://teamcity.example.com/")])
        .expect("must have validated");

    assert_eq!(conf.mode(), Mode::CloudImage);
    assert_eq!(conf.build_name(), "aws-agent");

    let teamcity = conf.teamcity().as_ref().expect("must have configured a server");
    assert_eq!(teamcity.endpoint().to_string(), "https://teamcity.example.com");
    assert_eq!(teamcity.auth().username(), "user");
    assert_eq!(teamcity.auth().password().expose_secret(), "pass");
    assert_eq!(teamcity.project_id(), "AgentPools");
    assert_eq!(
        teamcity.profile(),
        &Profile::new_cloud_image(String::from("linux-agent"))
    );
    assert_eq!(teamcity.timeout(), DEFAULT_TIMEOUT);
}

#[test]
fn custom_image_values() {
    let conf = config::decode([custom_image_bundle("https://teamcity.example.com")])
        .expect("must have validated");

    assert_eq!(conf.mode(), Mode::CustomImage);
    let teamcity = conf.teamcity().as_ref().expect("must have configured a server");
    assert_eq!(
        teamcity.profile(),
        &Profile::new_custom_image(String::from("vsphere-agent"), String::from("agent-7"))
    );
}

#[test]
fn mode_without_server() {
    let conf = config::decode([bundle(&[("custom_image_name", "vsphere-agent")])])
        .expect("must have validated");
    assert_eq!(conf.mode(), Mode::CustomImage);
    assert_eq!(conf.teamcity(), &None);

    let conf = config::decode([bundle(&[])]).expect("must have validated");
    assert_eq!(conf.mode(), Mode::CloudImage);
}

#[test]
fn later_bundles_win() {
    let conf = config::decode([
        cloud_image_bundle("https://teamcity.example.com"),
        bundle(&[("cloud_image", "windows-agent"), ("timeout", "5s")]),
    ])
    .expect("must have validated");

    let teamcity = conf.teamcity().as_ref().expect("must have configured a server");
    assert_eq!(
        teamcity.profile(),
        &Profile::new_cloud_image(String::from("windows-agent"))
    );
    assert_eq!(teamcity.timeout(), Duration::from_secs(5));
}

#[test]
fn later_bundles_can_disable_the_server() {
    let conf = config::decode([
        cloud_image_bundle("https://teamcity.example.com"),
        bundle(&[("teamcity_url", "")]),
    ])
    .expect("must have validated");
    assert_eq!(conf.teamcity(), &None);
}

#[test]
fn accepts_host_fields() {
    let raw = serde_yaml::from_str::<Value>(
        r#"
        packer_build_name: aws-agent
        packer_builder_type: amazon-ebs
        packer_debug: false
        packer_force: true
        packer_on_error: cleanup
        packer_user_variables:
          region: us-east-1
        packer_sensitive_variables: [password]
        "#,
    )
    .expect("must parse yaml");

    let conf = config::decode([raw]).expect("must have validated");
    assert_eq!(conf.build_name(), "aws-agent");
}

#[test]
fn empty_documents_are_ignored() {
    let conf = config::decode([Value::Null, cloud_image_bundle("https://teamcity.example.com")])
        .expect("must have validated");
    assert!(conf.teamcity().is_some());
}

#[test]
fn blank_keys_are_empty() {
    let raw = serde_yaml::from_str::<Value>(
        r#"
        teamcity_url:
        username:
        password:
        timeout:
        packer_build_name: docker
        packer_debug:
        packer_user_variables:
        "#,
    )
    .expect("must parse yaml");

    let conf = config::decode([raw]).expect("must have validated");
    assert_eq!(conf.build_name(), "docker");
    assert_eq!(conf.teamcity(), &None);
}

#[test]
fn blank_keys_are_reported_missing() {
    let raw = serde_yaml::from_str::<Value>(
        r#"
        teamcity_url: https://teamcity.example.com
        username: user
        password:
        project_id: AgentPools
        cloud_image:
        "#,
    )
    .expect("must parse yaml");

    let err = config::decode([raw]).expect_err("must have failed validation");
    assert_eq!(missing_fields(&err), vec![Field::Password, Field::CloudImage]);
}

#[test]
fn scalars_are_read_as_text() {
    let raw = serde_yaml::from_str::<Value>(
        r#"
        teamcity_url: https://teamcity.example.com
        username: 1001
        password: 123456
        project_id: 42
        cloud_image: true
        "#,
    )
    .expect("must parse yaml");

    let conf = config::decode([raw]).expect("must have validated");
    let teamcity = conf.teamcity().as_ref().expect("must have configured a server");
    assert_eq!(teamcity.auth().username(), "1001");
    assert_eq!(teamcity.auth().password().expose_secret(), "123456");
    assert_eq!(teamcity.project_id(), "42");
    assert_eq!(teamcity.profile(), &Profile::new_cloud_image(String::from("true")));
}

#[test]
fn scalars_are_accepted_without_server() {
    let raw = bundle(&[("teamcity_url", "")]);
    let Value::Mapping(mut raw) = raw else { panic!("bundle must be a mapping") };
    raw.insert(Value::from("password"), Value::from(123));

    let conf = config::decode([Value::Mapping(raw)]).expect("must have validated");
    assert_eq!(conf.teamcity(), &None);
}

#[test]
fn rejects_nested_values_for_text_fields() {
    set_vars!();
    let raw = serde_yaml::from_str::<Value>("username: [a, b]\n").expect("must parse yaml");

    let err = config::decode([raw]).expect_err("must have failed decoding");
    let rendered = format!("{err:?}");
    assert!(rendered.contains("expected a string"), "{rendered}");
}

#[test]
fn rejects_ambiguous_mode() {
    set_vars!();
    let err = config::decode([
        cloud_image_bundle("https://teamcity.example.com"),
        bundle(&[("custom_image_name", "vsphere-agent"), ("agent_name", "agent-7")]),
    ])
    .expect_err("must have failed validation");

    let rendered = format!("{err:?}");
    assert!(
        rendered.contains("cloud_image cannot be combined with custom_image_name or agent_name"),
        "{rendered}"
    );
    assert!(rendered.contains("'cloud_image' is 'linux-agent'"), "{rendered}");
    assert_eq!(missing_fields(&err), Vec::<Field>::new());
}

#[test]
fn ambiguous_mode_stacks_with_missing_fields() {
    set_vars!();
    let raw = bundle(&[
        ("teamcity_url", "https://teamcity.example.com"),
        ("cloud_image", "linux-agent"),
        ("agent_name", "agent-7"),
    ]);

    let err = config::decode([raw]).expect_err("must have failed validation");
    let rendered = format!("{err:?}");
    assert!(rendered.contains("cannot be combined"), "{rendered}");
    assert_eq!(
        missing_fields(&err),
        vec![Field::Username, Field::Password, Field::ProjectId, Field::CustomImageName]
    );
}

#[test]
fn blanking_cloud_image_switches_mode() {
    let conf = config::decode([
        cloud_image_bundle("https://teamcity.example.com"),
        serde_yaml::from_str::<Value>("cloud_image:\ncustom_image_name: vsphere-agent\nagent_name: agent-7\n")
            .expect("must parse yaml"),
    ])
    .expect("must have validated");
    assert_eq!(conf.mode(), Mode::CustomImage);
}

#[test]
fn ambiguous_mode_without_server_is_accepted() {
    let conf = config::decode([bundle(&[("cloud_image", "linux-agent"), ("agent_name", "agent-7")])])
        .expect("must have validated");
    assert_eq!(conf.mode(), Mode::CustomImage);
}

#[test]
fn rejects_unknown_fields() {
    set_vars!();
    let raw = bundle(&[("teamcity_uri", "https://teamcity.example.com")]);

    let err = config::decode([raw]).expect_err("must have failed decoding");
    let rendered = format!("{err:?}");
    assert!(rendered.contains("decode configuration"), "{rendered}");
    assert!(rendered.contains("teamcity_uri"), "{rendered}");
}

#[test]
fn rejects_non_mapping_bundles() {
    set_vars!();
    let err = config::decode([cloud_image_bundle("https://teamcity.example.com"), Value::from("oops")])
        .expect_err("must have failed decoding");
    let rendered = format!("{err:?}");
    assert!(rendered.contains("configuration bundle 1 is not a mapping"), "{rendered}");
}

#[test]
fn timeout_errors_stack_with_missing_fields() {
    set_vars!();
    let raw = bundle(&[
        ("teamcity_url", "https://teamcity.example.com"),
        ("timeout", "soon"),
    ]);

    let err = config::decode([raw]).expect_err("must have failed validation");
    assert_eq!(missing_fields(&err), CLOUD_IMAGE_FIELDS.to_vec());

    let rendered = format!("{err:?}");
    assert!(rendered.contains("timeout must be a duration"), "{rendered}");
}

#[test]
fn redacts_password() {
    let conf = config::decode([cloud_image_bundle("https://teamcity.example.com")])
        .expect("must have validated");
    let rendered = format!("{conf:?}");
    assert!(!rendered.contains("pass\""), "{rendered}");
    assert!(rendered.contains("<REDACTED>"), "{rendered}");
}

#[tokio::test]
async fn loads_files_in_order() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let first = dir.path().join("first.yml");
    let second = dir.path().join("second.yml");
    std::fs::write(
        &first,
        "teamcity_url: https://teamcity.example.com\nusername: user\npassword: pass\nproject_id: AgentPools\ncloud_image: linux-agent\n",
    )
    .expect("must write first file");
    std::fs::write(&second, "project_id: Agents\n").expect("must write second file");

    let conf = config::load(
        &[first, second],
        vec![bundle(&[("packer_build_name", "from-args")])],
    )
    .await
    .expect("must have loaded");

    assert_eq!(conf.build_name(), "from-args");
    let teamcity = conf.teamcity().as_ref().expect("must have configured a server");
    assert_eq!(teamcity.project_id(), "Agents");
}

#[tokio::test]
async fn load_reports_missing_file() {
    set_vars!();
    let err = config::load(&["testdata/config/does-not-exist.yml".into()], Vec::new())
        .await
        .expect_err("must have failed to load");
    let rendered = format!("{err:?}");
    assert!(rendered.contains("read config file"), "{rendered}");
    assert!(rendered.contains("does-not-exist.yml"), "{rendered}");
}
