mod checks;
pub mod code;
mod help;
pub mod limit;
mod map;
mod mapvote;
mod promote;
pub mod rename;
mod votekick;

use poise::serenity_prelude as serenity;

use crate::lobby::gateway::MemberInfo;
use crate::{Data, Error};

fn member_info(member: &serenity::Member) -> MemberInfo {
    MemberInfo {
        id: member.user.id,
        display_name: member.display_name().to_string(),
    }
}

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        help::help(),
        code::code(),
        code::c(),
        rename::rename(),
        limit::limit(),
        votekick::votekick(),
        promote::promote(),
        map::map(),
        mapvote::mapvote(),
    ]
}
