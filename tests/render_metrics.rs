use std::collections::HashMap;

use mailcraft::{
    application::{
        ports::ConfigSink,
        render::{RenderService, Substitutions},
    },
    domain::sections::SectionConfig,
    infra::{config_sink::LoggingConfigSink, telemetry},
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

#[tokio::test]
async fn editor_operations_emit_expected_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let service = RenderService::new();
    let substitutions: Substitutions = [("title", "Hello")].into_iter().collect();

    assert_eq!(
        service
            .render(Some("<h1>{{title}}</h1>"), Some(&substitutions))
            .expect("render succeeds"),
        "<h1>Hello</h1>"
    );
    assert!(service.render(Some(""), Some(&substitutions)).is_err());
    assert!(service.render(Some("{{title}}"), None).is_err());

    LoggingConfigSink::new()
        .save(&SectionConfig::seeded())
        .await
        .expect("logging sink accepts configuration");

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((composite_key.key().name().to_string(), count)),
            _ => None,
        })
        .collect();

    assert_eq!(counters.get("mailcraft_render_total"), Some(&1));
    assert_eq!(counters.get("mailcraft_render_failed_total"), Some(&2));
    assert_eq!(counters.get("mailcraft_config_saved_total"), Some(&1));
}
