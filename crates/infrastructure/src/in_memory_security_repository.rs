use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use atlasgate_application::{
    AccountDirectory, AddSystemRoleInput, NewUserAccount, ProvisionedSystemRole,
    SystemRoleRepository, UserAccount,
};
use atlasgate_core::{AppError, AppResult};
use atlasgate_domain::{
    PermissionGrant, PermissionKind, Role, database_permission_name, dataset_permission_name,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct DatabaseRecord {
    id: i64,
    name: String,
    sqlalchemy_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DatasetRecord {
    database_id: i64,
    table_name: String,
}

#[derive(Debug, Clone, Default)]
struct SecurityState {
    next_id: i64,
    roles: Vec<Role>,
    users: Vec<UserAccount>,
    databases: Vec<DatabaseRecord>,
    datasets: BTreeMap<i64, DatasetRecord>,
    role_grants: BTreeMap<i64, BTreeSet<(String, String)>>,
}

impl SecurityState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn find_or_create_role(&mut self, name: &str) -> Role {
        if let Some(role) = self.roles.iter().find(|role| role.name() == name) {
            return role.clone();
        }

        let role = Role::new(self.allocate_id(), name);
        self.roles.push(role.clone());
        role
    }

    fn find_or_create_database(&mut self, name: &str, sqlalchemy_uri: &str) -> i64 {
        if let Some(database) = self.databases.iter_mut().find(|record| record.name == name) {
            database.sqlalchemy_uri = sqlalchemy_uri.to_owned();
            return database.id;
        }

        let id = self.allocate_id();
        self.databases.push(DatabaseRecord {
            id,
            name: name.to_owned(),
            sqlalchemy_uri: sqlalchemy_uri.to_owned(),
        });
        id
    }

    fn grant(&mut self, role_id: i64, grant: &PermissionGrant) {
        self.role_grants
            .entry(role_id)
            .or_default()
            .insert((grant.kind().as_str().to_owned(), grant.resource().to_owned()));
    }
}

/// In-memory account directory and system-role store.
///
/// Provisioning works on a staged copy of the state that is only published
/// when every step succeeds.
#[derive(Debug, Default)]
pub struct InMemorySecurityRepository {
    state: RwLock<SecurityState>,
}

impl InMemorySecurityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset on a database record, creating the record when
    /// absent, and returns the dataset identifier.
    pub async fn add_dataset(&self, database_name: &str, table_name: &str) -> i64 {
        let mut state = self.state.write().await;
        let existing = state
            .databases
            .iter()
            .find(|record| record.name == database_name)
            .map(|record| record.id);
        let database_id = match existing {
            Some(id) => id,
            None => state.find_or_create_database(database_name, ""),
        };

        let dataset_id = state.allocate_id();
        state.datasets.insert(
            dataset_id,
            DatasetRecord {
                database_id,
                table_name: table_name.to_owned(),
            },
        );
        dataset_id
    }

    /// Returns the grants attached to the named role, sorted.
    pub async fn list_role_grants(&self, role_name: &str) -> Vec<PermissionGrant> {
        let state = self.state.read().await;
        let Some(role) = state.roles.iter().find(|role| role.name() == role_name) else {
            return Vec::new();
        };

        state
            .role_grants
            .get(&role.id())
            .map(|grants| {
                grants
                    .iter()
                    .filter_map(|(kind, resource)| {
                        kind.parse::<PermissionKind>()
                            .ok()
                            .map(|kind| PermissionGrant::new(kind, resource.as_str()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the names of all stored database records.
    pub async fn list_database_names(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .databases
            .iter()
            .map(|record| record.name.clone())
            .collect()
    }
}

#[async_trait]
impl AccountDirectory for InMemorySecurityRepository {
    async fn find_role(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .iter()
            .find(|role| role.name() == name)
            .cloned())
    }

    async fn add_role(&self, name: &str) -> AppResult<Role> {
        Ok(self.state.write().await.find_or_create_role(name))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .find(|user| same_email(&user.email, email))
            .cloned())
    }

    async fn add_user(&self, input: NewUserAccount) -> AppResult<UserAccount> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|user| {
            user.username == input.username || same_email(&user.email, &input.email)
        }) {
            return Err(AppError::Conflict(format!(
                "user '{}' already exists",
                input.username
            )));
        }

        let account = UserAccount {
            id: state.allocate_id(),
            username: input.username,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            roles: vec![input.role],
            login_count: 0,
            last_login: None,
        };
        state.users.push(account.clone());
        Ok(account)
    }

    async fn save_user_roles(&self, user_id: i64, roles: &[Role]) -> AppResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|user| user.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {user_id} does not exist")))?;

        let mut deduplicated: Vec<Role> = Vec::with_capacity(roles.len());
        for role in roles {
            if !deduplicated.contains(role) {
                deduplicated.push(role.clone());
            }
        }
        user.roles = deduplicated;
        Ok(())
    }

    async fn record_login(&self, user_id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.iter_mut().find(|user| user.id == user_id) {
            user.login_count += 1;
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl SystemRoleRepository for InMemorySecurityRepository {
    async fn provision_system_role(
        &self,
        input: AddSystemRoleInput,
    ) -> AppResult<ProvisionedSystemRole> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();

        let database_id =
            staged.find_or_create_database(input.database.as_str(), input.sqlalchemy_uri.as_str());
        let role = staged.find_or_create_role(input.role.as_str());

        let database_grant = PermissionGrant::new(
            PermissionKind::DatabaseAccess,
            database_permission_name(input.database.as_str(), database_id),
        );
        staged.grant(role.id(), &database_grant);

        let mut grants = vec![database_grant];
        for dataset_id in &input.datasets {
            let dataset = staged
                .datasets
                .get(dataset_id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("dataset {dataset_id} does not exist")))?;
            let database_name = staged
                .databases
                .iter()
                .find(|record| record.id == dataset.database_id)
                .map(|record| record.name.clone())
                .ok_or_else(|| {
                    AppError::Internal(format!("dataset {dataset_id} has no database"))
                })?;

            let dataset_grant = PermissionGrant::new(
                PermissionKind::DatasourceAccess,
                dataset_permission_name(
                    database_name.as_str(),
                    dataset.table_name.as_str(),
                    *dataset_id,
                ),
            );
            staged.grant(role.id(), &dataset_grant);
            grants.push(dataset_grant);
        }

        *state = staged;

        Ok(ProvisionedSystemRole {
            role,
            database_id,
            grants,
        })
    }
}

/// Matches emails the way `lower(email)` does in Postgres, folding Unicode case.
fn same_email(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
