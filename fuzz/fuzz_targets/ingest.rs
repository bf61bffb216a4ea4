//! Feeds arbitrary event sequences into the tracker and checks that the tree
//! stays navigable afterwards.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pim_console_core::{EventTracker, NodeId, TreeProjection, FIRST_JOB_ID};

/// Names are drawn from small pools so events collide on existing jobs.
#[derive(Debug, Arbitrary)]
enum Op {
    Create { session: u8, job: u8, parent: Option<u8> },
    Start { job: u8 },
    End { job: u8, failed: bool },
    Enable(bool),
    Flush,
    Reset,
}

fn session_name(n: u8) -> String {
    format!("session{}", n % 4)
}

fn job_name(n: u8) -> String {
    format!("job{}", n % 16)
}

fuzz_target!(|ops: Vec<Op>| {
    let mut tracker = EventTracker::new();
    for op in ops {
        match op {
            Op::Create { session, job, parent } => {
                let parent = parent.map(job_name).unwrap_or_default();
                tracker.create(&session_name(session), &job_name(job), &parent, "t", "");
            }
            Op::Start { job } => tracker.start(&job_name(job)),
            Op::End { job, failed } => {
                tracker.end(&job_name(job), if failed { "boom" } else { "" })
            }
            Op::Enable(enabled) => tracker.set_enabled(enabled),
            Op::Flush => tracker.flush(),
            Op::Reset => tracker.reset(),
        }
    }
    tracker.flush();

    let state = tracker.state();
    let model = TreeProjection::new(state);
    for id in FIRST_JOB_ID..state.next_job_id() {
        let Some(info) = state.job(id) else { continue };
        let parent = info.parent;
        assert!(state.children(parent).windows(2).all(|w| w[0] < w[1]));
        let row = state.row_for_job(id, parent).expect("job missing from its parent");
        assert_eq!(state.children(parent)[row], id);

        let index = model.node_index(NodeId::Job(id)).expect("job not addressable");
        let parent_index = model.parent(&index);
        match parent {
            NodeId::Session(_) | NodeId::Job(_) => {
                assert_eq!(parent_index.map(|p| p.id), Some(parent));
            }
            NodeId::Root => panic!("job {id} parented to root"),
        }
    }
});
