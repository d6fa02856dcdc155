//! Scoreboard and team state for 1.7 clients.
//!
//! 1.8 can show a different sidebar to each team color. 1.7 only has one
//! sidebar slot, so the session remembers which objective each color wants
//! and re-sends the sidebar whenever what the viewer should see changes.
//!
//! Score holder names longer than 16 characters are shown through a team
//! whose prefix and suffix carry what does not fit in the name.

use std::collections::{HashMap, HashSet};

use mc_rewind_proto::packets::v1_7;
use mc_rewind_proto::{FieldValue, Packet, Revision};

use crate::session::{SessionInfo, StoredObject};

/// Longest objective, team, prefix, suffix or score holder name 1.7 accepts.
pub const MAX_NAME_LEN: usize = 16;
/// Longest objective or team display name 1.7 accepts.
pub const MAX_DISPLAY_NAME_LEN: usize = 32;

/// Display slot of the sidebar.
pub const SIDEBAR_SLOT: i8 = 1;
/// First team-colored sidebar slot; slot `3 + color` belongs to `color`.
pub const FIRST_COLOR_SLOT: i8 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub color: i8,
    pub members: HashSet<String>,
}

/// Team standing in for a long score holder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTeam {
    /// Both the team name and its only member, the name the client scores.
    pub name: String,
    pub prefix: String,
    pub suffix: String,
}

#[derive(Debug, Default)]
pub struct Scoreboard {
    viewer: String,
    objectives: HashSet<String>,
    teams: HashMap<String, Team>,
    player_teams: HashMap<String, String>,
    color_sidebars: HashMap<i8, String>,
    independent_sidebar: Option<String>,
    /// Keyed by the full holder name.
    score_teams: HashMap<String, ScoreTeam>,
}

impl StoredObject for Scoreboard {
    fn create(info: &SessionInfo) -> Self {
        Self::new(info.username.clone())
    }
}

impl Scoreboard {
    pub fn new(viewer: impl Into<String>) -> Self {
        Self {
            viewer: viewer.into(),
            ..Default::default()
        }
    }

    /// Name of the player the client is logged in as.
    pub fn viewer(&self) -> &str {
        &self.viewer
    }

    // --- Objectives ---

    pub fn add_objective(&mut self, name: impl Into<String>) {
        self.objectives.insert(name.into());
    }

    /// Forget an objective and every sidebar showing it.
    pub fn remove_objective(&mut self, name: &str) {
        self.objectives.remove(name);
        self.color_sidebars.retain(|_, objective| objective != name);
        if self.independent_sidebar.as_deref() == Some(name) {
            self.independent_sidebar = None;
        }
    }

    pub fn objective_exists(&self, name: &str) -> bool {
        self.objectives.contains(name)
    }

    // --- Teams ---

    pub fn add_team(&mut self, name: impl Into<String>) {
        self.teams.entry(name.into()).or_default();
    }

    pub fn remove_team(&mut self, name: &str) {
        if let Some(team) = self.teams.remove(name) {
            for member in team.members {
                self.player_teams.remove(&member);
            }
        }
    }

    pub fn team_exists(&self, name: &str) -> bool {
        self.teams.contains_key(name)
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.get(name)
    }

    /// A player is in at most one team; joining another leaves the old one.
    pub fn add_player_to_team(&mut self, player: &str, team: &str) {
        if !self.teams.contains_key(team) {
            return;
        }
        if let Some(previous) = self.player_teams.insert(player.to_owned(), team.to_owned()) {
            if previous != team {
                if let Some(old) = self.teams.get_mut(&previous) {
                    old.members.remove(player);
                }
            }
        }
        if let Some(t) = self.teams.get_mut(team) {
            t.members.insert(player.to_owned());
        }
    }

    pub fn remove_player_from_team(&mut self, player: &str, team: &str) {
        if let Some(t) = self.teams.get_mut(team) {
            t.members.remove(player);
        }
        if self.player_teams.get(player).map(String::as_str) == Some(team) {
            self.player_teams.remove(player);
        }
    }

    pub fn is_player_in_team(&self, player: &str, team: &str) -> bool {
        self.player_teams.get(player).map(String::as_str) == Some(team)
    }

    pub fn player_team(&self, player: &str) -> Option<&str> {
        self.player_teams.get(player).map(String::as_str)
    }

    pub fn set_team_color(&mut self, team: &str, color: i8) {
        if let Some(t) = self.teams.get_mut(team) {
            t.color = color;
        }
    }

    pub fn team_color(&self, team: &str) -> Option<i8> {
        self.teams.get(team).map(|t| t.color)
    }

    pub fn player_team_color(&self, player: &str) -> Option<i8> {
        self.team_color(self.player_teams.get(player)?)
    }

    // --- Sidebars ---

    pub fn set_color_independent_sidebar(&mut self, objective: impl Into<String>) {
        self.independent_sidebar = Some(objective.into());
    }

    pub fn color_independent_sidebar(&self) -> Option<&str> {
        self.independent_sidebar.as_deref()
    }

    /// Objective shown to each team color.
    pub fn color_dependent_sidebar(&self) -> &HashMap<i8, String> {
        &self.color_sidebars
    }

    pub fn set_color_dependent_sidebar(&mut self, color: i8, objective: impl Into<String>) {
        self.color_sidebars.insert(color, objective.into());
    }

    /// Objective `viewer`'s sidebar should show, if any.
    pub fn viewer_sidebar(&self, viewer: &str) -> Option<&str> {
        self.player_team_color(viewer)
            .and_then(|color| self.color_sidebars.get(&color))
            .map(String::as_str)
            .or(self.independent_sidebar.as_deref())
    }

    /// Whether a color sidebar overrides the plain one for `viewer`.
    pub fn has_color_sidebar(&self, viewer: &str) -> bool {
        self.player_team_color(viewer)
            .is_some_and(|color| self.color_sidebars.contains_key(&color))
    }

    pub fn score_team(&self, holder: &str) -> Option<&ScoreTeam> {
        self.score_teams.get(holder)
    }

    /// The team showing `holder`, created on first use. The flag tells
    /// whether it was just created and still has to be sent.
    ///
    /// Returns `None` for names that fit, and when every split of the name
    /// clashes with a team already known.
    pub fn team_for_score(&mut self, holder: &str) -> Option<(ScoreTeam, bool)> {
        if let Some(team) = self.score_teams.get(holder) {
            return Some((team.clone(), false));
        }
        let chars: Vec<char> = holder.chars().collect();
        if chars.len() <= MAX_NAME_LEN {
            return None;
        }

        // prefer the longest prefix, so the name ends where the holder does
        let longest = (chars.len() - MAX_NAME_LEN).min(MAX_NAME_LEN);
        let team = (0..=longest).rev().find_map(|start| {
            let name: String = chars[start..start + MAX_NAME_LEN].iter().collect();
            let taken = self.teams.contains_key(&name)
                || self.score_teams.values().any(|t| t.name == name);
            (!taken).then(|| ScoreTeam {
                name,
                prefix: chars[..start].iter().collect(),
                suffix: chars[start + MAX_NAME_LEN..].iter().take(MAX_NAME_LEN).collect(),
            })
        })?;
        self.score_teams.insert(holder.to_owned(), team.clone());
        Some((team, true))
    }

    pub fn remove_team_for_score(&mut self, holder: &str) -> Option<ScoreTeam> {
        self.score_teams.remove(holder)
    }
}

/// A 1.7 display-scoreboard packet for the sidebar. An empty name clears it.
pub fn sidebar_packet(objective: Option<&str>) -> Packet {
    Packet::clientbound(
        v1_7::clientbound::DISPLAY_SCOREBOARD,
        Revision::V1_7,
        vec![
            FieldValue::Byte(SIDEBAR_SLOT),
            FieldValue::String(objective.unwrap_or_default().to_owned()),
        ],
    )
}

/// A 1.7 team packet removing `team`.
pub fn team_removal_packet(team: &str) -> Packet {
    Packet::clientbound(
        v1_7::clientbound::TEAMS,
        Revision::V1_7,
        vec![FieldValue::String(team.to_owned()), FieldValue::Byte(1)],
    )
}

/// A 1.7 team packet creating `team` with itself as the only member.
pub fn score_team_packet(team: &ScoreTeam) -> Packet {
    Packet::clientbound(
        v1_7::clientbound::TEAMS,
        Revision::V1_7,
        vec![
            FieldValue::String(team.name.clone()),
            FieldValue::Byte(0),
            FieldValue::String(team.name.clone()),
            FieldValue::String(team.prefix.clone()),
            FieldValue::String(team.suffix.clone()),
            // friendly fire off
            FieldValue::Byte(0),
            FieldValue::StringArray(vec![team.name.clone()]),
        ],
    )
}

/// Strip `§x` formatting codes.
pub fn strip_formatting(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Fit a score holder name: strip formatting when too long, then truncate.
pub fn fit_score_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        return name.to_owned();
    }
    let stripped = strip_formatting(name);
    mc_rewind_proto::codec::truncate_chars(&stripped, MAX_NAME_LEN)
}
