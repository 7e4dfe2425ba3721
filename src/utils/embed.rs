use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::lobby::vote::{Tally, VoteOutcome, VoteSession};
use crate::lobby::TEXT_CHANNEL_NAME;

const BLURPLE: u32 = 0x5865F2;
const RED: u32 = 0xED4245;
const GREEN: u32 = 0x57F287;

pub fn lobby_welcome(prefix: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("Welcome to the lobby!")
        .description("Here's some tips to get you started")
        .field(
            format!("The {TEXT_CHANNEL_NAME}"),
            format!(
                "Only members in the lobby's voice chat can see the {TEXT_CHANNEL_NAME}. \
                 This is your private space to chat and discuss."
            ),
            false,
        )
        .field(
            "Make it your own!",
            format!("Rename the lobby using the `{prefix}rename` command."),
            false,
        )
        .field(
            "Limiting members",
            format!(
                "Use the `{prefix}limit` command to change how many members can join the \
                 voice channel. Use `0` to remove the limit."
            ),
            false,
        )
        .field(
            format!("The `{prefix}code` command"),
            format!(
                "Use the `{prefix}code` command to communicate game codes. Use this command to \
                 get the current game code, or set a new one with `{prefix}code ABCXYZ`. This \
                 command also has the alias `{prefix}c`."
            ),
            false,
        )
        .color(BLURPLE)
}

pub fn lobby_help(prefix: &str) -> CreateEmbed {
    let lobby_cmds = format!(
        "\
`{prefix}code [code]` (`{prefix}c`) — show or set the game code
`{prefix}rename <name>` — rename the lobby (twice per 10 minutes)
`{prefix}limit <0-99>` — set the voice user limit, `0` for none
`{prefix}votekick <member> <reason>` — start a vote to kick a member
`{prefix}promote <member>` — give a member moderation rights in the lobby
`{prefix}map [name]` — show a map
`{prefix}mapvote` — vote on the next map"
    );

    CreateEmbed::new()
        .title("Lobby help")
        .description("Join the seed voice channel to create your own lobby.")
        .field("Lobby commands", lobby_cmds, false)
        .color(BLURPLE)
}

fn name_list(members: impl Iterator<Item = String>) -> String {
    let names: Vec<String> = members.collect();
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join("\n")
    }
}

pub fn votekick_started(session: &VoteSession) -> CreateEmbed {
    CreateEmbed::new()
        .title("Votekick started!")
        .description(format!(
            "<@{}> has started a vote to kick <@{}> from the lobby. If kicked, {} will be \
             unable to rejoin the lobby.\n\nReason: {}",
            session.initiator.id,
            session.target.id,
            session.target.display_name,
            session.reason
        ))
        .field("Votes required to kick", session.quorum.to_string(), false)
        .field(
            "Members allowed to vote",
            name_list(session.eligible.iter().map(|m| m.display_name.clone())),
            false,
        )
        .color(RED)
}

pub fn votekick_results(session: &VoteSession, outcome: VoteOutcome, tally: &Tally) -> CreateEmbed {
    let verdict = match outcome {
        VoteOutcome::Kicked => "has been kicked from",
        VoteOutcome::NotKicked => "was **not** kicked from",
    };

    CreateEmbed::new()
        .title("Votekick results")
        .description(format!(
            "{} {verdict} {}.\nReason: {}\nVotes needed: {}",
            session.target.display_name, session.lobby_name, session.reason, session.quorum
        ))
        .field(
            format!("Voted yes ({})", tally.affirm.len()),
            name_list(tally.affirm.iter().map(|m| m.display_name.clone())),
            false,
        )
        .field(
            format!("Voted no ({})", tally.deny.len()),
            name_list(tally.deny.iter().map(|m| m.display_name.clone())),
            false,
        )
        .color(match outcome {
            VoteOutcome::Kicked => RED,
            VoteOutcome::NotKicked => GREEN,
        })
}

pub fn mapvote_poll(options: &[(&str, &str)], minutes: u64) -> CreateEmbed {
    let lines: Vec<String> = options
        .iter()
        .map(|(emoji, name)| format!("{emoji} - {name}"))
        .collect();

    CreateEmbed::new()
        .title("Map vote")
        .description(format!(
            "Vote for a map by reacting to this message.\n\n{}",
            lines.join("\n")
        ))
        .footer(CreateEmbedFooter::new(format!(
            "The poll will close in {minutes} minute(s)."
        )))
        .color(BLURPLE)
}

pub fn mapvote_results(results: &[(String, usize)]) -> CreateEmbed {
    let description: String = results
        .iter()
        .map(|(option, votes)| format!("{option} - {votes}\n"))
        .collect();

    CreateEmbed::new()
        .title("Mapvote Results")
        .description(description)
        .color(BLURPLE)
}

pub fn error(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(message)
        .color(RED)
}
