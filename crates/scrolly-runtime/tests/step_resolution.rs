#![forbid(unsafe_code)]

//! Chart resolution through a full story session.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use proptest::prelude::*;
use scrolly_core::event::{Direction, StepEvent};
use scrolly_layout::{LayoutError, LayoutKind};
use scrolly_runtime::config::ChartSpec;
use scrolly_runtime::{
    ChartResolver, ChartUpdate, Message, ResolveError, StoryConfig, StorySession, Topic, UpdateMode,
};
use serde_json::{Value, json};

fn data() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("cases.csv".to_owned(), json!([{"year": 1990, "value": 10}])),
        ("deaths.csv".to_owned(), json!([{"year": 1990, "value": 2}])),
        ("trend.csv".to_owned(), json!([1, 2, 3])),
    ])
}

fn charts_published(session: &mut StorySession<BTreeMap<String, Value>>, event: StepEvent) -> Vec<ChartUpdate> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = session.bus_mut().subscribe(&[Topic::Chart], move |m| {
        if let Message::Chart(update) = m {
            sink.borrow_mut().push(update.clone());
        }
    });
    session.on_step_enter(&event);
    session.bus_mut().unsubscribe(id);
    seen.take()
}

#[test]
fn dual_layout_resolves_each_chart_separately() {
    let config = StoryConfig::from_json(
        r#"{ "steps": [
            { "id": "opening", "chart": {
                "layout": "dual",
                "charts": [
                    { "type": "line", "dataFile": "cases.csv" },
                    { "type": "bar", "dataFile": "deaths.csv" }
                ]
            } },
            { "id": "footer" }
        ] }"#,
    )
    .unwrap();
    let mut session = StorySession::new(config, data());

    let updates = charts_published(&mut session, StepEvent::new(0, Direction::Down));
    assert_eq!(updates.len(), 1);
    let update = &updates[0];
    assert_eq!(update.layout, LayoutKind::Dual);
    assert_eq!(update.charts.len(), 2);
    assert_eq!(update.charts[0].data, Some(json!([{"year": 1990, "value": 10}])));
    assert_eq!(update.charts[1].data, Some(json!([{"year": 1990, "value": 2}])));
    assert_eq!(update.charts[1].chart_type.as_deref(), Some("bar"));
}

#[test]
fn scrolling_back_through_a_transition_animates() {
    let config = StoryConfig::from_json(
        r#"{ "steps": [
            { "id": "opening", "chart": { "type": "line", "dataFile": "trend.csv" } },
            { "id": "intro", "chart": { "type": "line", "dataFile": "trend.csv", "updateMode": "transition" } },
            { "id": "footer" }
        ] }"#,
    )
    .unwrap();
    let mut session = StorySession::new(config, data());

    let down = charts_published(&mut session, StepEvent::new(0, Direction::Down));
    assert_eq!(down[0].update_mode, UpdateMode::Replace);

    let up = charts_published(&mut session, StepEvent::new(0, Direction::Up));
    assert_eq!(up[0].update_mode, UpdateMode::Transition);
    assert_eq!(up[0].direction, Direction::Up);
}

#[test]
fn unknown_layout_publishes_placeholder() {
    let config = StoryConfig::from_json(
        r#"{ "steps": [ { "id": "opening", "chart": { "layout": "carousel" } }, { "id": "footer" } ] }"#,
    )
    .unwrap();
    let mut session = StorySession::new(config, data());
    let updates = charts_published(&mut session, StepEvent::new(0, Direction::Down));
    assert!(updates[0].is_error());
    assert_eq!(updates[0].error.as_deref(), Some("unknown layout 'carousel'"));
}

fn sub_charts(n: usize) -> ChartSpec {
    let charts: Vec<Value> = (0..n)
        .map(|_| json!({"type": "line", "dataFile": "trend.csv"}))
        .collect();
    serde_json::from_value(json!({"layout": "dual", "charts": charts})).unwrap()
}

proptest! {
    #[test]
    fn dual_requires_exactly_two_charts(n in 0usize..6) {
        let result = ChartResolver::default().resolve(&sub_charts(n), None, Direction::Down, &data());
        if n == 2 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(
                result.unwrap_err(),
                ResolveError::Layout(LayoutError::ChartCount {
                    layout: LayoutKind::Dual,
                    expected: 2,
                    found: n,
                })
            );
        }
    }
}
