//! In-process fan-out of live order events.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use d2y_sdk::objects::LiveEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::identity::{Caller, Role};

/// Per-subscriber buffer size.
///
/// A subscriber that falls this far behind starts losing messages.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// A named audience for live events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Group {
    Admin,
    Merchant(String),
    Order(Uuid),
    User(String),
}

impl Group {
    /// Groups a session joins as soon as it is established.
    pub fn for_session(caller: &Caller) -> Vec<Group> {
        let mut groups = match &caller.role {
            Role::AdminLike(_) => vec![Group::Admin],
            Role::Merchant(merchant_id) => vec![Group::Merchant(merchant_id.clone())],
            Role::Consumer => Vec::new(),
        };
        groups.push(Group::User(caller.user_id.clone()));
        groups
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Admin => f.write_str("admin"),
            Group::Merchant(id) => write!(f, "merchant:{id}"),
            Group::Order(id) => write!(f, "order:{id}"),
            Group::User(id) => write!(f, "user:{id}"),
        }
    }
}

type SubscriberId = u64;

struct Member {
    tx: mpsc::Sender<Arc<LiveEvent>>,
    groups: HashSet<Group>,
}

#[derive(Default)]
struct Registry {
    groups: HashMap<Group, HashSet<SubscriberId>>,
    members: HashMap<SubscriberId, Member>,
}

impl Registry {
    fn join(&mut self, id: SubscriberId, group: Group) {
        let Some(member) = self.members.get_mut(&id) else {
            return;
        };
        if member.groups.insert(group.clone()) {
            self.groups.entry(group).or_default().insert(id);
        }
    }

    fn remove(&mut self, id: SubscriberId) {
        let Some(member) = self.members.remove(&id) else {
            return;
        };
        for group in member.groups {
            if let Some(ids) = self.groups.get_mut(&group) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.groups.remove(&group);
                }
            }
        }
    }
}

struct Inner {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Group membership registry and publisher.
///
/// Cloning yields another handle to the same registry. Delivery is best
/// effort and at most once: nothing is persisted or replayed, and a
/// subscriber whose buffer is full misses the message.
#[derive(Clone)]
pub struct FanoutHub {
    inner: Arc<Inner>,
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FanoutHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry();
        f.debug_struct("FanoutHub")
            .field("subscribers", &registry.members.len())
            .field("groups", &registry.groups.len())
            .finish()
    }
}

impl FanoutHub {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_SUBSCRIBER_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::default()),
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Register a new subscriber already joined to `groups`.
    pub fn subscribe(&self, groups: impl IntoIterator<Item = Group>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        {
            let mut registry = self.inner.registry();
            registry.members.insert(
                id,
                Member {
                    tx,
                    groups: HashSet::new(),
                },
            );
            for group in groups {
                registry.join(id, group);
            }
        }
        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
            rx,
        }
    }

    /// Hand `event` to every member of `groups`.
    ///
    /// A subscriber in several of the target groups receives it once.
    /// Returns how many subscribers accepted the message.
    pub fn publish(&self, groups: &[Group], event: LiveEvent) -> usize {
        let event = Arc::new(event);
        let registry = self.inner.registry();
        let targets: HashSet<SubscriberId> = groups
            .iter()
            .filter_map(|g| registry.groups.get(g))
            .flatten()
            .copied()
            .collect();

        let mut delivered = 0;
        for id in targets {
            let Some(member) = registry.members.get(&id) else {
                continue;
            };
            match member.tx.try_send(Arc::clone(&event)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber = id,
                        event = event.name(),
                        "subscriber buffer full, dropping live event"
                    );
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        tracing::debug!(event = event.name(), delivered, "live event published");
        delivered
    }

    pub fn member_count(&self, group: &Group) -> usize {
        self.inner
            .registry()
            .groups
            .get(group)
            .map_or(0, HashSet::len)
    }
}

/// A live subscriber's end of the hub.
///
/// Dropping it leaves every group it joined.
pub struct Subscription {
    id: SubscriberId,
    hub: Weak<Inner>,
    rx: mpsc::Receiver<Arc<LiveEvent>>,
}

impl Subscription {
    pub fn join(&self, group: Group) {
        if let Some(hub) = self.hub.upgrade() {
            hub.registry().join(self.id, group);
        }
    }

    /// Next event, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Arc<LiveEvent>> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<LiveEvent>> {
        self.rx.try_recv().ok()
    }

    pub fn leave_all(&self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.registry().remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.leave_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaffRole;
    use d2y_sdk::objects::OrderEventResponse;
    use time::OffsetDateTime;

    fn event(order_id: Uuid) -> LiveEvent {
        LiveEvent::OrderEventCreated(OrderEventResponse {
            id: Uuid::now_v7(),
            order_id,
            event_type: "PAYMENT_PAID".into(),
            payload: serde_json::json!({}),
            created_at: OffsetDateTime::now_utc(),
            actor_user_id: None,
        })
    }

    #[test]
    fn test_group_names() {
        let id = Uuid::nil();
        assert_eq!(Group::Admin.to_string(), "admin");
        assert_eq!(Group::Merchant("m1".into()).to_string(), "merchant:m1");
        assert_eq!(Group::Order(id).to_string(), format!("order:{id}"));
        assert_eq!(Group::User("u1".into()).to_string(), "user:u1");
    }

    #[test]
    fn test_session_groups_follow_role() {
        assert_eq!(
            Group::for_session(&Caller::staff("root", StaffRole::Support)),
            vec![Group::Admin, Group::User("root".into())]
        );
        assert_eq!(
            Group::for_session(&Caller::merchant("m1", "bakery")),
            vec![Group::Merchant("bakery".into()), Group::User("m1".into())]
        );
        assert_eq!(
            Group::for_session(&Caller::consumer("alice")),
            vec![Group::User("alice".into())]
        );
    }

    #[tokio::test]
    async fn test_publish_reaches_each_member_once() {
        let hub = FanoutHub::new();
        let order_id = Uuid::now_v7();
        let mut admin = hub.subscribe([Group::Admin]);
        admin.join(Group::Order(order_id));
        let mut outsider = hub.subscribe([Group::Merchant("other".into())]);

        let delivered = hub.publish(&[Group::Admin, Group::Order(order_id)], event(order_id));
        assert_eq!(delivered, 1);

        let received = admin.recv().await.unwrap();
        assert_eq!(received.name(), "order.event.created");
        assert!(admin.try_recv().is_none());
        assert!(outsider.try_recv().is_none());
    }

    #[test]
    fn test_drop_leaves_all_groups() {
        let hub = FanoutHub::new();
        let order_id = Uuid::now_v7();
        let sub = hub.subscribe([Group::Admin, Group::User("root".into())]);
        sub.join(Group::Order(order_id));
        assert_eq!(hub.member_count(&Group::Order(order_id)), 1);

        drop(sub);
        assert_eq!(hub.member_count(&Group::Admin), 0);
        assert_eq!(hub.member_count(&Group::Order(order_id)), 0);
        assert_eq!(hub.publish(&[Group::Admin], event(order_id)), 0);
    }

    #[test]
    fn test_full_buffer_drops_for_that_subscriber_only() {
        let hub = FanoutHub::with_buffer(1);
        let order_id = Uuid::now_v7();
        let mut slow = hub.subscribe([Group::Admin]);
        let mut fast = hub.subscribe([Group::Admin]);

        assert_eq!(hub.publish(&[Group::Admin], event(order_id)), 2);
        assert!(fast.try_recv().is_some());
        assert_eq!(hub.publish(&[Group::Admin], event(order_id)), 1);

        assert!(slow.try_recv().is_some());
        assert!(slow.try_recv().is_none());
        assert!(fast.try_recv().is_some());
    }
}
