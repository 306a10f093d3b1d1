//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use memberflow::cache::RecordingCache;
use memberflow::core::types::{GroupName, Uid};
use memberflow::hooks::RecordingHookBus;
use memberflow::lifecycle::{LifecycleDeps, MembershipLifecycleManager};
use memberflow::store::{Keyspace, KvStore, MemoryStore};

/// A group to seed.
pub struct GroupSpec<'a> {
    pub name: &'a str,
    pub hidden: bool,
    pub members: &'a [u64],
    pub owners: &'a [u64],
}

impl<'a> GroupSpec<'a> {
    pub fn visible(name: &'a str, members: &'a [u64]) -> Self {
        Self {
            name,
            hidden: false,
            members,
            owners: &[],
        }
    }

    pub fn hidden(name: &'a str, members: &'a [u64]) -> Self {
        Self {
            name,
            hidden: true,
            members,
            owners: &[],
        }
    }

    pub fn owned_by(mut self, owners: &'a [u64]) -> Self {
        self.owners = owners;
        self
    }
}

/// A seeded store with a manager wired onto it.
pub struct Fixture {
    pub store: MemoryStore,
    pub hooks: RecordingHookBus,
    pub cache: RecordingCache,
    pub manager: MembershipLifecycleManager,
}

impl Fixture {
    pub fn new(store: MemoryStore) -> Self {
        let hooks = RecordingHookBus::new();
        let cache = RecordingCache::new(256);
        let manager = MembershipLifecycleManager::new(LifecycleDeps::from_store_with(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            Arc::new(hooks.clone()),
        ));
        Self {
            store,
            hooks,
            cache,
            manager,
        }
    }

    pub fn keyspace(&self) -> Keyspace {
        self.store.snapshot().unwrap()
    }

    pub async fn member_count(&self, group: &str) -> Option<i64> {
        self.store
            .get_object_field(&format!("group:{}", group), "memberCount")
            .await
            .unwrap()
            .map(|v| v.parse().unwrap())
    }

    pub async fn visible_score(&self, group: &str) -> Option<i64> {
        self.store
            .sorted_set_score("groups:visible:memberCount", group)
            .await
            .unwrap()
    }

    pub async fn is_member(&self, group: &str, uid: u64) -> bool {
        self.store
            .sorted_set_score(&format!("group:{}:members", group), &uid.to_string())
            .await
            .unwrap()
            .is_some()
    }

    pub async fn is_owner(&self, group: &str, uid: u64) -> bool {
        self.store
            .is_set_member(&format!("group:{}:owners", group), &uid.to_string())
            .await
            .unwrap()
    }

    pub async fn title(&self, uid: u64) -> Option<String> {
        self.store
            .get_object_field(&format!("user:{}", uid), "groupTitle")
            .await
            .unwrap()
    }
}

/// Seed groups the way the platform creates them.
pub async fn seed(store: &MemoryStore, groups: &[GroupSpec<'_>]) {
    for (i, g) in groups.iter().enumerate() {
        let created = 1_000 + i as i64;
        store
            .set_object(
                &format!("group:{}", g.name),
                &[
                    ("name", g.name.to_string()),
                    ("hidden", if g.hidden { "1" } else { "0" }.to_string()),
                    ("memberCount", g.members.len().to_string()),
                    ("createtime", created.to_string()),
                ],
            )
            .await
            .unwrap();
        store
            .sorted_set_add("groups:createtime", created, g.name)
            .await
            .unwrap();
        if !g.hidden {
            store
                .sorted_set_add("groups:visible:createtime", created, g.name)
                .await
                .unwrap();
            store
                .sorted_set_add(
                    "groups:visible:memberCount",
                    g.members.len() as i64,
                    g.name,
                )
                .await
                .unwrap();
        }
        for uid in g.members {
            store
                .sorted_set_add(&format!("group:{}:members", g.name), created, &uid.to_string())
                .await
                .unwrap();
        }
        for uid in g.owners {
            store
                .set_add(&format!("group:{}:owners", g.name), &uid.to_string())
                .await
                .unwrap();
        }
    }
}

/// Give a user a record with the given raw title.
pub async fn seed_user(store: &MemoryStore, uid: u64, title: Option<&str>) {
    let mut fields = vec![("username", format!("user{}", uid))];
    if let Some(title) = title {
        fields.push(("groupTitle", title.to_string()));
    }
    store
        .set_object(&format!("user:{}", uid), &fields)
        .await
        .unwrap();
}

pub fn names(list: &[&str]) -> Vec<GroupName> {
    list.iter().map(|s| GroupName::new(*s).unwrap()).collect()
}

pub fn uid(id: u64) -> Uid {
    Uid::new(id)
}
