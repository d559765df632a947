//! Component includes and the application schema.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use shinogramma::app;
use shinogramma::components::notify::{self, WebhookConfig};
use shinogramma::settings::schema::SectionOrigin;
use shinogramma::settings::{
    load_settings, ComponentRegistry, Entry, EntryType, NoPrompt, ReconcileOptions, Registry,
    SchemaDeclaration, SchemaError, ScriptedPrompter, SettingValue, SettingsError,
    SettingsProvider, CLASS_ENTRY,
};

mod common;
use common::SettingsFile;

struct Camera;

impl SettingsProvider for Camera {
    fn settings_schema(&self) -> Vec<Entry> {
        vec![
            Entry::optional("FPS", EntryType::Integer).with_default(15),
            Entry::required("NAME", EntryType::String),
        ]
    }
}

fn camera() -> Arc<dyn SettingsProvider> {
    Arc::new(Camera)
}

fn components() -> ComponentRegistry {
    let mut components = ComponentRegistry::new();
    components.register("video.Camera", camera);
    components
}

#[test]
fn test_include_is_idempotent() {
    let components = components();
    let declaration = SchemaDeclaration::new().include("CAM", "video.Camera").unwrap();
    let mut registry = Registry::resolve(&declaration, &components).unwrap();
    let before = registry.clone();

    registry.include("cam", "video.Camera", &components).unwrap();
    assert_eq!(registry, before);

    let section = registry.section("CAM").unwrap();
    assert_eq!(
        section.origin(),
        &SectionOrigin::Included {
            component: "video.Camera".into()
        }
    );
    assert_eq!(section.len(), 3);
}

#[test]
fn test_include_records_component() {
    let components = components();
    let declaration = SchemaDeclaration::new().include("CAM", "video.Camera").unwrap();
    let registry = Registry::resolve(&declaration, &components).unwrap();

    let class = registry.entry("CAM", CLASS_ENTRY).unwrap();
    assert_eq!(class.ty(), EntryType::Component);
    assert!(!class.is_required());
    let reference = class.data().and_then(|v| v.as_component()).unwrap();
    assert_eq!(reference.key(), "video.Camera");
    assert_eq!(reference.component().settings_schema().len(), 2);
}

#[test]
fn test_include_over_declared_section_is_rejected() {
    let components = components();
    let declaration = SchemaDeclaration::new()
        .declare("CAM", vec![Entry::optional("X", EntryType::String)])
        .unwrap();
    let mut registry = Registry::resolve(&declaration, &components).unwrap();

    let err = registry
        .include("CAM", "video.Camera", &components)
        .unwrap_err();
    assert!(matches!(err, SchemaError::MixedSection { .. }));

    let err = SchemaDeclaration::new()
        .include("CAM", "video.Camera")
        .unwrap()
        .declare("CAM", vec![Entry::optional("X", EntryType::String)])
        .unwrap_err();
    assert!(matches!(err, SchemaError::MixedSection { .. }));
}

#[test]
fn test_unknown_component_leaves_section_empty() {
    let declaration = SchemaDeclaration::new()
        .include("GHOST", "nowhere.Ghost")
        .unwrap()
        .declare("APP", vec![Entry::optional("NAME", EntryType::String)])
        .unwrap();
    let registry = Registry::resolve(&declaration, &components()).unwrap();

    assert!(registry.section("GHOST").unwrap().is_empty());
    assert!(registry.entry("APP", "NAME").is_some());
}

#[test]
fn test_included_entries_are_prompted_and_populated() {
    let file = SettingsFile::with_contents("[CAM]\nfps = 30\n");
    let components = components();
    let declaration = SchemaDeclaration::new().include("CAM", "video.Camera").unwrap();

    let mut prompter = ScriptedPrompter::new(["porch"]);
    let settings = load_settings(
        &file.path,
        &declaration,
        &components,
        &mut prompter,
        ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(settings.get("CAM", "FPS"), Some(&SettingValue::Int(30)));
    assert_eq!(settings.get("CAM", "NAME"), Some(&SettingValue::Str("porch".into())));
    assert_eq!(prompter.asked().len(), 1);
}

#[test]
fn test_class_can_be_overridden_from_file() {
    let file = SettingsFile::with_contents("[CAM]\nname = porch\nclass = video.Camera\n");
    let components = components();
    let declaration = SchemaDeclaration::new().include("CAM", "video.Camera").unwrap();

    let settings = load_settings(
        &file.path,
        &declaration,
        &components,
        &mut NoPrompt,
        ReconcileOptions::default(),
    )
    .unwrap();
    let reference = settings
        .get("CAM", CLASS_ENTRY)
        .and_then(|v| v.as_component())
        .unwrap();
    assert_eq!(reference.key(), "video.Camera");

    let broken = SettingsFile::with_contents("[CAM]\nname = porch\nclass = video.Nothing\n");
    let err = load_settings(
        &broken.path,
        &declaration,
        &components,
        &mut NoPrompt,
        ReconcileOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SettingsError::Coercion { ref key, .. } if key == CLASS_ENTRY));
}

#[test]
fn test_app_settings_from_file() {
    let file = SettingsFile::with_contents(
        r#"[TELEGRAM]
api_key = 123:abc
chat_id = 111, 222, abc

[SHINOBI]
api_key = key
group_key = group
base_url = http://localhost
port = 8080

[SHINOGRAMMA]
loglevel = debug

[WEBHOOK]
server = true
port = 5005
trustlist = {"nvr": "192.168.1.5", "bad": 12}
ratelimit = 3
"#,
    );

    let settings = load_settings(
        &file.path,
        &app::schema().unwrap(),
        &app::components(),
        &mut NoPrompt,
        ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(app::allowed_chats(&settings), vec![111, 222]);
    assert_eq!(app::log_level(&settings).as_str(), "DEBUG");
    assert_eq!(settings.get("SHINOBI", "PORT"), Some(&SettingValue::Int(8080)));
    assert_eq!(
        settings.get("MONITOR", "PAGE_SIZE"),
        Some(&SettingValue::Int(10))
    );

    let webhook = WebhookConfig::from_settings(&settings, "WEBHOOK").unwrap();
    assert!(webhook.enabled);
    assert_eq!(webhook.port, 5005);
    assert_eq!(webhook.rate_limit, 3);
    assert_eq!(webhook.trustlist.len(), 1);
    assert!(webhook
        .trustlist
        .contains_ip(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5))));

    let class = settings
        .get("WEBHOOK", CLASS_ENTRY)
        .and_then(|v| v.as_component())
        .unwrap();
    assert_eq!(class.key(), notify::COMPONENT_KEY);

    let names: Vec<String> = settings.flatten().into_iter().map(|(n, _)| n).collect();
    assert!(names.contains(&"SHINOBI_BASE_URL".to_string()));
    assert!(names.contains(&"WEBHOOK_RATELIMIT".to_string()));
}

#[test]
fn test_app_write_defaults() {
    let file = SettingsFile::missing();
    let mut prompter = ScriptedPrompter::new(["key", "http://localhost", "group", "tg-key"]);

    load_settings(
        &file.path,
        &app::schema().unwrap(),
        &app::components(),
        &mut prompter,
        ReconcileOptions {
            write_defaults: true,
            ..ReconcileOptions::default()
        },
    )
    .unwrap();

    assert_eq!(prompter.asked()[3], ("TELEGRAM".to_string(), "API_KEY".to_string()));
    let written = file.read();
    assert!(written.contains("[WEBHOOK]"));
    assert!(written.contains("ratelimit = 5"));
    assert!(written.contains("port = 5001"));
    assert!(written.contains("loglevel = INFO"));
    assert!(written.contains("class = notify.WebhookServer"));
}
