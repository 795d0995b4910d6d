use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{FlowEvent, FlowEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore: Send {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, session_id: Uuid, kind: FlowEventKind) -> FlowEvent;
    /// Lista eventos de una sesión (orden ascendente por seq).
    fn list(&self, session_id: Uuid) -> Vec<FlowEvent>;
    /// Descarta el stream de una sesión terminada.
    fn discard(&mut self, session_id: Uuid);
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<FlowEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, session_id: Uuid, kind: FlowEventKind) -> FlowEvent {
        let vec = self.inner.entry(session_id).or_default();
        let seq = vec.len() as u64;
        let ev = FlowEvent { seq,
                             session_id,
                             kind,
                             ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, session_id: Uuid) -> Vec<FlowEvent> {
        self.inner.get(&session_id).cloned().unwrap_or_default()
    }

    fn discard(&mut self, session_id: Uuid) {
        self.inner.remove(&session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_per_session() {
        let mut store = InMemoryEventStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let e0 = store.append_kind(a, FlowEventKind::SessionFailed { message: "x".into() });
        let e1 = store.append_kind(a, FlowEventKind::StepRegressed { from_index: 1, to_index: 0 });
        let f0 = store.append_kind(b, FlowEventKind::FlowCompleted { flow_id: "f".into() });
        assert_eq!((e0.seq, e1.seq, f0.seq), (0, 1, 0));
        assert_eq!(store.list(a).len(), 2);
        assert!(store.list(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn discard_removes_only_that_session() {
        let mut store = InMemoryEventStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.append_kind(a, FlowEventKind::FlowCompleted { flow_id: "f".into() });
        store.append_kind(b, FlowEventKind::FlowCompleted { flow_id: "g".into() });
        store.discard(a);
        assert!(store.list(a).is_empty());
        assert_eq!(store.list(b).len(), 1);
        assert_eq!(store.inner.len(), 1);
    }
}
