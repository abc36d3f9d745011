// Migration graph - dependency resolution and deterministic ordering

use std::collections::{BTreeMap, BTreeSet};

use super::{Dependency, Migration, MigrationKey};
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug)]
pub struct MigrationGraph {
    nodes: BTreeMap<MigrationKey, Migration>,
    /// Resolved dependencies of each node
    parents: BTreeMap<MigrationKey, Vec<MigrationKey>>,
    order: Vec<MigrationKey>,
}

impl MigrationGraph {
    pub fn new(migrations: Vec<Migration>, auth: &AuthConfig) -> AppResult<Self> {
        let mut nodes = BTreeMap::new();
        for migration in migrations {
            let key = migration.key();
            if nodes.insert(key.clone(), migration).is_some() {
                return Err(AppError::MigrationError(format!(
                    "Migration {} is defined more than once",
                    key
                )));
            }
        }

        let mut parents = BTreeMap::new();
        for (key, migration) in &nodes {
            let mut resolved = Vec::new();
            for dependency in &migration.dependencies {
                let parent = Self::resolve_dependency(&nodes, dependency, auth)?;
                if !nodes.contains_key(&parent) {
                    return Err(AppError::MigrationError(format!(
                        "Migration {} depends on nonexistent migration {}",
                        key, parent
                    )));
                }
                resolved.push(parent);
            }
            parents.insert(key.clone(), resolved);
        }

        let order = Self::topological_order(&parents)?;

        Ok(Self {
            nodes,
            parents,
            order,
        })
    }

    fn resolve_dependency(
        nodes: &BTreeMap<MigrationKey, Migration>,
        dependency: &Dependency,
        auth: &AuthConfig,
    ) -> AppResult<MigrationKey> {
        match dependency {
            Dependency::On(key) => Ok(key.clone()),
            Dependency::Swappable(setting) => {
                let label = setting.resolve(auth);
                let app_label = label.split('.').next().unwrap_or_default();
                nodes
                    .keys()
                    .find(|key| key.app_label == app_label)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::MigrationError(format!(
                            "{} is set to '{}' but app '{}' has no migrations",
                            setting.setting_name(),
                            label,
                            app_label
                        ))
                    })
            }
        }
    }

    /// Kahn's algorithm; ties are broken by key so the plan is stable
    fn topological_order(
        parents: &BTreeMap<MigrationKey, Vec<MigrationKey>>,
    ) -> AppResult<Vec<MigrationKey>> {
        let mut remaining: BTreeMap<&MigrationKey, usize> = parents
            .iter()
            .map(|(key, deps)| (key, deps.len()))
            .collect();
        let mut ready: BTreeSet<&MigrationKey> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(key, _)| *key)
            .collect();
        let mut order = Vec::with_capacity(parents.len());

        while let Some(next) = ready.pop_first() {
            remaining.remove(next);
            order.push(next.clone());
            for (child, deps) in parents {
                if deps.contains(next) {
                    if let Some(count) = remaining.get_mut(child) {
                        *count -= deps.iter().filter(|d| *d == next).count();
                        if *count == 0 {
                            ready.insert(child);
                        }
                    }
                }
            }
        }

        if !remaining.is_empty() {
            let stuck: Vec<String> = remaining.keys().map(|key| key.to_string()).collect();
            return Err(AppError::MigrationError(format!(
                "Circular dependency between migrations: {}",
                stuck.join(", ")
            )));
        }

        Ok(order)
    }

    pub fn get(&self, key: &MigrationKey) -> Option<&Migration> {
        self.nodes.get(key)
    }

    pub fn dependencies_of(&self, key: &MigrationKey) -> &[MigrationKey] {
        self.parents.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// All migrations, dependencies first
    pub fn plan(&self) -> Vec<&Migration> {
        self.order.iter().filter_map(|key| self.nodes.get(key)).collect()
    }

    /// Migrations planned before `key`
    pub fn plan_before(&self, key: &MigrationKey) -> Vec<&Migration> {
        self.order
            .iter()
            .take_while(|k| *k != key)
            .filter_map(|k| self.nodes.get(k))
            .collect()
    }

    pub fn has_app(&self, app_label: &str) -> bool {
        self.nodes.keys().any(|key| key.app_label == app_label)
    }

    /// `roots` plus everything that transitively depends on them
    pub fn descendants(&self, roots: &BTreeSet<MigrationKey>) -> BTreeSet<MigrationKey> {
        let mut found = roots.clone();
        // Plan order visits parents before children, so one pass suffices
        for key in &self.order {
            if self.dependencies_of(key).iter().any(|parent| found.contains(parent)) {
                found.insert(key.clone());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ent_schema::SwappableSetting;
    use crate::migrations::all_migrations;

    fn keys(plan: Vec<&Migration>) -> Vec<String> {
        plan.iter().map(|m| m.key().to_string()).collect()
    }

    #[test]
    fn test_plan_puts_user_model_first() {
        let graph = MigrationGraph::new(all_migrations(), &Config::default().auth).unwrap();
        assert_eq!(
            keys(graph.plan()),
            vec!["auth.0001_initial", "website.0001_initial"]
        );
        assert_eq!(
            graph.dependencies_of(&MigrationKey::new("website", "0001_initial")),
            &[MigrationKey::new("auth", "0001_initial")]
        );
    }

    #[test]
    fn test_plan_is_deterministic_for_independent_apps() {
        let migrations = vec![
            Migration::new("zeta", "0001_initial"),
            Migration::new("alpha", "0002_more")
                .depends_on(Dependency::On(MigrationKey::new("alpha", "0001_initial"))),
            Migration::new("alpha", "0001_initial"),
        ];
        let graph = MigrationGraph::new(migrations, &Config::default().auth).unwrap();
        assert_eq!(
            keys(graph.plan()),
            vec!["alpha.0001_initial", "alpha.0002_more", "zeta.0001_initial"]
        );
    }

    #[test]
    fn test_missing_dependency_is_rejected() {
        let migrations = vec![Migration::new("website", "0001_initial")
            .depends_on(Dependency::On(MigrationKey::new("auth", "0009_gone")))];
        let err = MigrationGraph::new(migrations, &Config::default().auth).unwrap_err();
        assert!(err.to_string().contains("nonexistent migration auth.0009_gone"));
    }

    #[test]
    fn test_swapped_user_model_without_migrations_is_rejected() {
        let mut auth = Config::default().auth;
        auth.user_model = "accounts.Member".to_string();
        let migrations = vec![Migration::new("website", "0001_initial")
            .depends_on(Dependency::Swappable(SwappableSetting::AuthUserModel))];

        let err = MigrationGraph::new(migrations, &auth).unwrap_err();
        assert!(err.to_string().contains("AUTH_USER_MODEL"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let migrations = vec![
            Migration::new("a", "0001").depends_on(Dependency::On(MigrationKey::new("b", "0001"))),
            Migration::new("b", "0001").depends_on(Dependency::On(MigrationKey::new("a", "0001"))),
        ];
        let err = MigrationGraph::new(migrations, &Config::default().auth).unwrap_err();
        assert!(err.to_string().contains("Circular dependency"));
    }

    #[test]
    fn test_descendants_follow_dependencies() {
        let graph = MigrationGraph::new(all_migrations(), &Config::default().auth).unwrap();
        let roots: BTreeSet<_> = [MigrationKey::new("auth", "0001_initial")].into_iter().collect();
        let found = graph.descendants(&roots);
        assert!(found.contains(&MigrationKey::new("website", "0001_initial")));

        let roots: BTreeSet<_> = [MigrationKey::new("website", "0001_initial")].into_iter().collect();
        assert_eq!(graph.descendants(&roots).len(), 1);
    }
}
