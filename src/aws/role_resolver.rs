use crate::adfs::saml_parsers::RoleAuthorization;
use crate::aws::{Account, Role};
use crate::error::ResolveError;
use log::warn;

/// Copies each authorization's principal onto the catalog role with the same
/// ARN. The assertion is authoritative: a scraped role the assertion does not
/// authorize is unusable and dropped here, before anything is counted or
/// shown. Accounts left without roles disappear with them.
pub fn merge_principals(
    catalog: Vec<Account>,
    authorizations: &[RoleAuthorization],
) -> Vec<Account> {
    let mut merged = vec![];

    for account in catalog {
        let (name, roles) = account.into_parts();
        let mut usable = vec![];

        for mut role in roles {
            match authorizations.iter().find(|a| a.role_arn == role.arn()) {
                Some(authorization) => {
                    role.set_principal_arn(authorization.principal_arn.clone());
                    usable.push(role);
                }
                None => warn!(
                    "dropping role {} (not present in the assertion's role attribute)",
                    role.arn()
                ),
            }
        }

        if !usable.is_empty() {
            merged.push(Account::new(name, usable));
        }
    }

    merged
}

/// Keeps only roles whose ARN contains `filter` (case-sensitive); accounts
/// whose role list ends up empty are dropped. The catalog is rebuilt rather
/// than mutated in place. An empty filter keeps everything.
pub fn filter_catalog(catalog: Vec<Account>, filter: &str) -> Vec<Account> {
    if filter.is_empty() {
        return catalog;
    }

    let mut filtered = vec![];
    for account in catalog {
        let (name, roles) = account.into_parts();
        let roles: Vec<Role> = roles
            .into_iter()
            .filter(|role| role.arn().contains(filter))
            .collect();

        if !roles.is_empty() {
            filtered.push(Account::new(name, roles));
        }
    }

    filtered
}

/// Picks the role to assume. Zero usable roles is an error, one is
/// auto-selected without prompting, several hand the catalog to `chooser`
/// for one line of input. Roles are numbered flat, 0-based, continuously
/// across accounts in scrape order; anything that does not parse to an
/// in-range index is an [`ResolveError::InvalidSelection`], with no retry.
pub fn resolve<F>(catalog: Vec<Account>, chooser: F) -> Result<Role, ResolveError>
where
    F: FnOnce(&[Account]) -> String,
{
    let mut flat: Vec<Role> = catalog
        .iter()
        .flat_map(|account| account.roles())
        .collect();

    if flat.is_empty() {
        return Err(ResolveError::NoRolesAvailable);
    }
    if flat.len() == 1 {
        return Ok(flat.remove(0));
    }

    let max = flat.len() - 1;
    let input = chooser(&catalog);
    let input = input.trim();

    let index: usize = input.parse().map_err(|_| ResolveError::InvalidSelection {
        input: input.to_string(),
        max,
    })?;

    if index > max {
        return Err(ResolveError::InvalidSelection {
            input: input.to_string(),
            max,
        });
    }

    Ok(flat.remove(index))
}
