//! Display ordering for list results

use crds::VirtualMachineClusterInstancetype;
use k8s_openapi::api::core::v1::Event;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

fn event_time(event: &Event) -> Option<&Time> {
    event
        .last_timestamp
        .as_ref()
        .or(event.metadata.creation_timestamp.as_ref())
}

/// Newest first by `lastTimestamp`, falling back to the creation time.
/// Events with neither go last.
pub fn sort_events_newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| event_time(b).cmp(&event_time(a)));
}

/// Smallest first by the CPU label, then the memory label. Classes missing
/// a label sort after labelled ones; ties break on name.
pub fn sort_compute_classes(classes: &mut [VirtualMachineClusterInstancetype]) {
    classes.sort_by_cached_key(|class| {
        let cpu = class.cpu_label();
        let memory = class.memory_gib_label();
        (
            cpu.is_none(),
            cpu,
            memory.is_none(),
            memory,
            class.metadata.name.clone().unwrap_or_default(),
        )
    });
}
