#![no_main]

//! Fuzz target for scope operations
//!
//! Interleaves scope switches with resolution and checks that scoped
//! instances are shared exactly within one scope id.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_container::{Container, Instance, Registration};
use std::collections::HashMap;
use std::sync::Arc;

struct RequestContext;

#[derive(Debug, Arbitrary)]
enum ScopeOp {
    Begin(u8),
    End,
    Enter(u8),
    ResolveScoped,
    ResolveSingleton,
    Clear,
}

fn register(container: &Container) {
    container.register("ctx", Registration::factory(|_| Ok(RequestContext)).scoped());
    container.register("app", Registration::factory(|_| Ok(RequestContext)));
}

fuzz_target!(|ops: Vec<ScopeOp>| {
    let container = Container::new();
    register(&container);

    // instance seen per scope id since the last clear or end of that scope
    let mut seen: HashMap<String, Instance> = HashMap::new();
    let mut app: Option<Instance> = None;

    for op in ops.into_iter().take(100) { // Limit operations to prevent OOM
        match op {
            ScopeOp::Begin(id) => {
                container.begin_scope(format!("scope-{}", id % 4));
            }
            ScopeOp::End => {
                if let Some(id) = container.end_scope() {
                    seen.remove(id.as_str());
                }
                assert!(container.active_scope().is_none());
            }
            ScopeOp::Enter(id) => {
                let id = format!("guarded-{}", id % 4);
                {
                    let guard = container.enter_scope(id.as_str());
                    assert_eq!(guard.id().as_str(), id);
                    let a = container.resolve("ctx").unwrap();
                    let b = container.resolve("ctx").unwrap();
                    assert!(Arc::ptr_eq(&a, &b));
                }
                assert!(container.active_scope().is_none());
                seen.remove(&id);
            }
            ScopeOp::ResolveScoped => {
                let instance = container.resolve("ctx").unwrap();
                match container.active_scope() {
                    Some(id) => {
                        let first = seen
                            .entry(id.as_str().to_string())
                            .or_insert_with(|| Arc::clone(&instance));
                        assert!(Arc::ptr_eq(first, &instance));
                    }
                    None => {
                        let again = container.resolve("ctx").unwrap();
                        assert!(!Arc::ptr_eq(&instance, &again));
                    }
                }
            }
            ScopeOp::ResolveSingleton => {
                let instance = container.resolve("app").unwrap();
                let first = app.get_or_insert_with(|| Arc::clone(&instance));
                assert!(Arc::ptr_eq(first, &instance));
            }
            ScopeOp::Clear => {
                container.clear();
                register(&container);
                seen.clear();
                app = None;
            }
        }
    }
});
