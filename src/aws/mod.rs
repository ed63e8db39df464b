pub mod credentials_file;
pub mod federation;
pub mod role_resolver;
pub mod sts;

/// One assumable role as scraped from the AWS account picker. The principal
/// ARN stays absent until the matching pair from the assertion is merged in;
/// a role without a principal cannot be assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    arn: String,
    display_name: String,
    principal_arn: Option<String>,
}

impl Role {
    pub fn new(arn: String, display_name: String) -> Role {
        Role {
            arn,
            display_name,
            principal_arn: None,
        }
    }

    pub fn arn(&self) -> String {
        self.arn.clone()
    }

    pub fn display_name(&self) -> String {
        self.display_name.clone()
    }

    pub fn principal_arn(&self) -> Option<String> {
        self.principal_arn.clone()
    }

    pub(crate) fn set_principal_arn(&mut self, principal_arn: String) {
        self.principal_arn = Some(principal_arn);
    }
}

/// An account block from the picker page. Owns its roles exclusively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    name: String,
    roles: Vec<Role>,
}

impl Account {
    pub fn new(name: String, roles: Vec<Role>) -> Account {
        Account { name, roles }
    }

    pub fn name(&self) -> String {
        self.name.clone()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.roles.clone()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Role>) {
        (self.name, self.roles)
    }
}

/// Temporary credentials from one `AssumeRoleWithSAML` exchange. Produced
/// once per run, written to the credentials file, then dropped.
#[derive(Debug, Clone)]
pub struct Credential {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: String,
    assumed_role_arn: String,
}

impl Credential {
    pub fn new(
        access_key_id: String,
        secret_access_key: String,
        session_token: String,
        expiration: String,
        assumed_role_arn: String,
    ) -> Credential {
        Credential {
            access_key_id,
            secret_access_key,
            session_token,
            expiration,
            assumed_role_arn,
        }
    }

    pub fn access_key_id(&self) -> String {
        self.access_key_id.clone()
    }

    pub fn secret_access_key(&self) -> String {
        self.secret_access_key.clone()
    }

    pub fn session_token(&self) -> String {
        self.session_token.clone()
    }

    /// RFC3339 timestamp after which the credentials stop working.
    pub fn expiration(&self) -> String {
        self.expiration.clone()
    }

    /// The assumed-role-user ARN reported back by the token exchange.
    pub fn assumed_role_arn(&self) -> String {
        self.assumed_role_arn.clone()
    }
}
