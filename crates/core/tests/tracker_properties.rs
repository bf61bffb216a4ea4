use pim_console_core::{
    EventTracker, JobState, ModelEvent, NodeId, ProjectionObserver, TrackerState, TreeProjection,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create {
        session: u8,
        job: u8,
        parent: Option<u8>,
    },
    Start(u8),
    End(u8, bool),
    Flush,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..3, 0u8..12, proptest::option::of(0u8..12))
            .prop_map(|(session, job, parent)| Op::Create { session, job, parent }),
        2 => (0u8..12).prop_map(Op::Start),
        2 => (0u8..12, any::<bool>()).prop_map(|(job, failed)| Op::End(job, failed)),
        1 => Just(Op::Flush),
    ]
}

fn apply(tracker: &mut EventTracker, op: &Op) {
    match op {
        Op::Create { session, job, parent } => {
            let parent = parent.map(|p| format!("job{p}")).unwrap_or_default();
            tracker.create(&format!("session{session}"), &format!("job{job}"), &parent, "t", "");
        }
        Op::Start(job) => tracker.start(&format!("job{job}")),
        Op::End(job, failed) => tracker.end(&format!("job{job}"), if *failed { "error" } else { "" }),
        Op::Flush => tracker.flush(),
    }
}

fn all_parents(state: &TrackerState) -> Vec<NodeId> {
    let mut parents: Vec<NodeId> = (0..state.session_count()).map(NodeId::Session).collect();
    let mut i = 0;
    while i < parents.len() {
        let children: Vec<NodeId> = state.children(parents[i]).iter().map(|&id| NodeId::Job(id)).collect();
        parents.extend(children);
        i += 1;
    }
    parents
}

proptest! {
    #[test]
    fn child_rows_match_positions(ops in proptest::collection::vec(op(), 0..80)) {
        let mut tracker = EventTracker::new();
        for op in &ops {
            apply(&mut tracker, op);
        }

        let state = tracker.state();
        for parent in all_parents(state) {
            let children = state.children(parent);
            prop_assert!(children.windows(2).all(|w| w[0] < w[1]));
            for (i, &child) in children.iter().enumerate() {
                prop_assert_eq!(state.row_for_job(child, parent), Some(i));
                prop_assert_eq!(state.parent_for(NodeId::Job(child)), parent);
            }
        }
    }

    #[test]
    fn projection_parent_round_trips(ops in proptest::collection::vec(op(), 0..60)) {
        let mut tracker = EventTracker::new();
        for op in &ops {
            apply(&mut tracker, op);
        }

        let model = TreeProjection::new(tracker.state());
        let mut stack: Vec<_> = (0..model.row_count(None))
            .filter_map(|row| model.index(row, 0, None))
            .collect();
        while let Some(index) = stack.pop() {
            for row in 0..model.row_count(Some(&index)) {
                let child = model.index(row, 0, Some(&index));
                prop_assert!(child.is_some());
                let child = child.unwrap();
                prop_assert_eq!(model.parent(&child), Some(index));
                stack.push(child);
            }
        }
    }

    #[test]
    fn every_insert_is_announced_then_confirmed(ops in proptest::collection::vec(op(), 0..60)) {
        let observer = ProjectionObserver::new(4096);
        let mut rx = observer.subscribe();
        let mut tracker = EventTracker::new();
        tracker.add_observer(observer);
        for op in &ops {
            apply(&mut tracker, op);
        }

        let mut open = None;
        let mut inserted = 0usize;
        while let Ok(event) = rx.try_recv() {
            match event {
                ModelEvent::RowsAboutToBeInserted { parent, first, .. } => {
                    prop_assert!(open.is_none());
                    open = Some((parent, first));
                }
                ModelEvent::RowsInserted { parent, first, .. } => {
                    prop_assert_eq!(open.take(), Some((parent, first)));
                    inserted += 1;
                }
                _ => {}
            }
        }
        prop_assert!(open.is_none());
        let state = tracker.state();
        prop_assert_eq!(inserted, state.session_count() + state.job_count());
    }
}

#[test]
fn full_lifecycle_across_sessions() {
    let mut tracker = EventTracker::new();
    tracker.create("imap", "fetch-headers", "", "ItemFetchJob", "INBOX");
    tracker.create("imap", "fetch-bodies", "fetch-headers", "ItemFetchJob", "");
    tracker.create("maildir", "sync", "", "CollectionSync", "");
    tracker.start("fetch-headers");
    tracker.start("fetch-bodies");
    tracker.end("fetch-bodies", "");
    tracker.end("fetch-headers", "server closed connection");
    tracker.start("sync");
    tracker.flush();

    let state = tracker.state();
    assert_eq!(state.sessions(), ["imap".to_string(), "maildir".to_string()]);
    assert_eq!(state.job_count(), 3);

    let headers = state.info(state.job_id("fetch-headers").unwrap()).unwrap();
    assert_eq!(headers.state, JobState::Failed);
    assert_eq!(headers.state_label(), "Failed: server closed connection");

    let bodies = state.info(state.job_id("fetch-bodies").unwrap()).unwrap();
    assert_eq!(bodies.parent, NodeId::Job(headers.id));
    assert_eq!(bodies.state, JobState::Ended);

    let sync = state.info(state.job_id("sync").unwrap()).unwrap();
    assert_eq!(sync.parent, NodeId::Session(1));
    assert_eq!(sync.state_label(), "Running");
}

#[test]
fn reset_through_projection_stream() {
    let observer = ProjectionObserver::new(64);
    let mut rx = observer.subscribe();
    let mut tracker = EventTracker::new();
    tracker.add_observer(observer);

    tracker.create("session1", "job1", "", "type1", "dbg1");
    tracker.start("job1");
    tracker.reset();
    tracker.start("job1");
    tracker.end("job1", "");
    tracker.flush();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 6);
    assert_eq!(events[4], ModelEvent::ModelAboutToBeReset);
    assert_eq!(events[5], ModelEvent::ModelReset);
}
