use serenity::model::guild::Member;
use serenity::model::permissions::Permissions;
use serenity::model::user::User as DiscordUser;

use crate::commands::giveaway::models::{RoleId, UserId};

// The invoking user in the plain identifiers the giveaway engine works with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Requester {
    pub user_id: UserId,
    pub roles: Vec<RoleId>,
    pub is_administrator: bool,
}

impl Requester {
    pub fn new(user_id: UserId, roles: Vec<RoleId>, permissions: Permissions) -> Self {
        Requester {
            user_id,
            roles,
            is_administrator: has_admin_authority(permissions),
        }
    }
}

// Members who can manage the server are allowed to manage every giveaway.
pub fn has_admin_authority(permissions: Permissions) -> bool {
    permissions.administrator() || permissions.manage_guild()
}

impl From<&Member> for Requester {
    fn from(member: &Member) -> Self {
        let roles = member.roles.iter().map(|role| role.get()).collect();
        let permissions = member.permissions.unwrap_or(Permissions::empty());
        Requester::new(member.user.id.get(), roles, permissions)
    }
}

impl From<&DiscordUser> for Requester {
    fn from(user: &DiscordUser) -> Self {
        Requester::new(user.id.get(), Vec::new(), Permissions::empty())
    }
}

#[cfg(test)]
mod tests {
    use serenity::model::id::UserId as DiscordUserId;
    use serenity::model::permissions::Permissions;
    use serenity::model::user::User as DiscordUser;

    use crate::models::{Requester, has_admin_authority};

    #[test]
    fn test_admin_authority() {
        assert_eq!(has_admin_authority(Permissions::ADMINISTRATOR), true);
        assert_eq!(has_admin_authority(Permissions::MANAGE_GUILD), true);
        assert_eq!(
            has_admin_authority(Permissions::SEND_MESSAGES | Permissions::MANAGE_MESSAGES),
            false
        );
        assert_eq!(has_admin_authority(Permissions::empty()), false);
    }

    #[test]
    fn test_requester_from_permissions() {
        let requester = Requester::new(1, vec![5, 6], Permissions::MANAGE_GUILD);

        assert_eq!(requester.user_id, 1);
        assert_eq!(requester.roles, vec![5, 6]);
        assert_eq!(requester.is_administrator, true);
    }

    #[test]
    fn test_requester_from_user() {
        let mut user = DiscordUser::default();
        user.id = DiscordUserId::new(42);

        let requester = Requester::from(&user);

        assert_eq!(requester, Requester::new(42, Vec::new(), Permissions::empty()));
        assert_eq!(requester.is_administrator, false);
    }
}
