use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::Serialize;
use sqlx::{Sqlite, Transaction};

use crate::{
    auth::jwt::Claims,
    engine::{
        bracket::{ADVANCEMENT_BONUS, Bracket, advancement_bracket},
        rating::Ledger,
        schedule::{self, Group, Schedule},
        standings::{self, GroupTable, Standing},
    },
    errors::AppError,
    models::{
        player::Player,
        tournament::{Format, Match, Stage, Tournament},
    },
    notifier::{Event, Notifier},
    payloads::{CloseRegistration, NewTournament},
    repositories::{
        bracket_repo,
        match_repo::{self, insert_schedule},
        player_repo,
        registration_repo::{self, DbRegistration, select_registrations},
        tournament_repo::{self, STATUS_ACTIVE, get_tournament},
    },
};

pub const MAX_LEAGUE_ROUNDS: u32 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDetails {
    pub tournament: Tournament,
    pub registrations: Vec<DbRegistration>,
    pub matches: Vec<Match>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum StandingsView {
    League { standings: Vec<Standing> },
    Groups { groups: Vec<GroupTable> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnockoutCreated {
    pub players: Vec<u32>,
    pub bonuses: Vec<u32>,
    pub schedule: Schedule,
}

/// Maps a missing tournament row to `TournamentNotFound`.
pub(crate) async fn load_tournament(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: u32,
) -> Result<Tournament, AppError> {
    match get_tournament(executor, id).await {
        Ok(t) => Tournament::try_from(t),
        Err(sqlx::Error::RowNotFound) => Err(AppError::TournamentNotFound),
        Err(e) => Err(AppError::Database(e)),
    }
}

fn validate_new_tournament(payload: &NewTournament) -> Result<Format, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::EmptyTournamentName);
    }
    let format = Format::try_from(payload.format.as_str())?;
    match format {
        Format::League => {
            let rounds = payload.rounds.unwrap_or(1);
            if !(1..=MAX_LEAGUE_ROUNDS).contains(&rounds) {
                return Err(AppError::InvalidNumberOfRounds(rounds));
            }
        }
        Format::GroupsKnockout => {
            match payload.group_count {
                Some(n) if n > 0 => {}
                other => return Err(AppError::InvalidGroupCount(other.unwrap_or(0))),
            }
            match payload.advance_count {
                Some(n) if n > 0 => {}
                other => return Err(AppError::InvalidAdvanceCount(other.unwrap_or(0))),
            }
        }
        Format::Knockout => {}
    }
    Ok(format)
}

/// Creates the tournament. With an initial player list the players are
/// registered and the matches generated in the same transaction.
pub async fn create_tournament(
    pool: &sqlx::SqlitePool,
    claims: &Claims,
    payload: NewTournament,
) -> Result<(i64, Schedule), AppError> {
    let format = validate_new_tournament(&payload)?;
    let mut tx = pool.begin().await?;
    let id = tournament_repo::create_tournament(&mut tx, claims.sub, format, &payload).await?;
    let mut schedule = Schedule::default();
    if let Some(players) = payload.players.as_ref() {
        for player_id in players.iter() {
            add_registration(&mut tx, id as u32, *player_id).await?;
        }
        let tournament = load_tournament(tx.as_mut(), id as u32).await?;
        let registrations = select_registrations(tx.as_mut(), id as u32).await?;
        schedule = generate_matches(&mut tx, &tournament, &registrations, None).await?;
    }
    tx.commit().await?;
    tracing::info!(
        "tournament {} ({}) created with {} matches",
        id,
        format,
        schedule.matches.len()
    );
    Ok((id, schedule))
}

async fn add_registration(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
    player_id: u32,
) -> Result<i64, AppError> {
    if player_repo::get_player(tx.as_mut(), player_id).await?.is_none() {
        return Err(AppError::PlayerNotFound(player_id));
    }
    match registration_repo::create_registration(tx, tournament_id, player_id).await {
        Ok(id) => Ok(id),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::DuplicateRegistration(player_id))
        }
        Err(e) => Err(AppError::Database(e)),
    }
}

pub async fn register_player(
    pool: &sqlx::SqlitePool,
    tournament_id: u32,
    player_id: u32,
) -> Result<i64, AppError> {
    let tournament = load_tournament(pool, tournament_id).await?;
    if !tournament.registration_open {
        return Err(AppError::RegistrationClosed);
    }
    let mut tx = pool.begin().await?;
    let id = add_registration(&mut tx, tournament_id, player_id).await?;
    tournament_repo::mark_tournament_updated(tournament_id, &mut tx).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn confirm_payment(
    pool: &sqlx::SqlitePool,
    tournament_id: u32,
    player_id: u32,
) -> Result<(), AppError> {
    load_tournament(pool, tournament_id).await?;
    if !registration_repo::confirm_payment(pool, tournament_id, player_id).await? {
        return Err(AppError::RegistrationNotFound(player_id));
    }
    Ok(())
}

/// Generates the matches for the registered players and opens the
/// tournament. With fewer than two players nothing is generated and
/// registration stays open.
pub async fn close_registration(
    pool: &sqlx::SqlitePool,
    tournament_id: u32,
    payload: CloseRegistration,
) -> Result<Schedule, AppError> {
    let mut tx = pool.begin().await?;
    let tournament = load_tournament(tx.as_mut(), tournament_id).await?;
    if !tournament.registration_open {
        return Err(AppError::RegistrationClosed);
    }
    let registrations = select_registrations(tx.as_mut(), tournament_id).await?;
    let schedule = generate_matches(
        &mut tx,
        &tournament,
        &registrations,
        payload.group_assignments.as_ref(),
    )
    .await?;
    tx.commit().await?;
    Ok(schedule)
}

/// Seeded brackets order players by rating, strongest first; equal ratings
/// keep registration order.
fn seeding_order(registrations: &[DbRegistration]) -> Vec<u32> {
    let mut ordered: Vec<&DbRegistration> = registrations.iter().collect();
    ordered.sort_by(|a, b| b.rating.cmp(&a.rating));
    ordered.iter().map(|r| r.player_id).collect()
}

async fn generate_matches(
    tx: &mut Transaction<'_, Sqlite>,
    tournament: &Tournament,
    registrations: &[DbRegistration],
    assignments: Option<&HashMap<u32, u32>>,
) -> Result<Schedule, AppError> {
    let players: Vec<u32> = registrations.iter().map(|r| r.player_id).collect();
    if players.len() < 2 {
        tracing::debug!(
            "tournament {} has {} player(s), no matches generated",
            tournament.id,
            players.len()
        );
        return Ok(Schedule::default());
    }
    let schedule = match tournament.format {
        Format::Knockout => {
            let bracket = if tournament.seeded {
                Bracket::seeded(&seeding_order(registrations))
            } else {
                Bracket::sequential(&players)
            };
            bracket_repo::save_bracket(tx, tournament.id, &bracket).await?;
            bracket.schedule()
        }
        Format::League => schedule::league(&players, tournament.rounds),
        Format::GroupsKnockout => {
            let group_count = tournament.group_count.unwrap_or(0);
            let groups = match assignments {
                Some(assigned) => schedule::partition_groups(&players, group_count, Some(assigned))?,
                None => {
                    let mut drawn = players.clone();
                    drawn.shuffle(&mut rand::thread_rng());
                    schedule::partition_groups(&drawn, group_count, None)?
                }
            };
            for group in groups.iter() {
                for player_id in group.players.iter() {
                    registration_repo::set_group(tx, tournament.id, *player_id, &group.name).await?;
                }
            }
            schedule::group_stage(&groups)
        }
    };
    if !schedule.byes.is_empty() {
        tracing::debug!("tournament {}: byes for {:?}", tournament.id, schedule.byes);
    }
    insert_schedule(tx, tournament.id, &schedule).await?;
    tournament_repo::set_status(tx, tournament.id, STATUS_ACTIVE).await?;
    Ok(schedule)
}

pub async fn read_tournament(
    pool: &sqlx::SqlitePool,
    id: u32,
) -> Result<TournamentDetails, AppError> {
    let tournament = load_tournament(pool, id).await?;
    let registrations = select_registrations(pool, id).await?;
    let matches = match_repo::list_matches(pool, id)
        .await?
        .into_iter()
        .map(Match::try_from)
        .collect::<Result<Vec<_>, AppError>>()?;
    Ok(TournamentDetails {
        tournament,
        registrations,
        matches,
    })
}

pub async fn list_tournaments(pool: &sqlx::SqlitePool) -> Result<Vec<Tournament>, AppError> {
    tournament_repo::list_tournaments(pool)
        .await?
        .into_iter()
        .map(Tournament::try_from)
        .collect()
}

/// Groups as recorded on the registrations, in `Group A`, `Group B`, ... order.
fn registration_groups(registrations: &[DbRegistration]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for registration in registrations.iter() {
        let Some(name) = registration.group_name.as_ref() else {
            continue;
        };
        match groups.iter_mut().find(|g| &g.name == name) {
            Some(group) => group.players.push(registration.player_id),
            None => groups.push(Group {
                name: name.clone(),
                players: vec![registration.player_id],
            }),
        }
    }
    groups.sort_by(|a, b| a.name.len().cmp(&b.name.len()).then_with(|| a.name.cmp(&b.name)));
    groups
}

pub async fn standings(pool: &sqlx::SqlitePool, id: u32) -> Result<StandingsView, AppError> {
    let tournament = load_tournament(pool, id).await?;
    let registrations = select_registrations(pool, id).await?;
    match tournament.format {
        Format::League => {
            let matches: Vec<Match> = match_repo::list_stage_matches(pool, id, Stage::League)
                .await?
                .into_iter()
                .map(Match::try_from)
                .collect::<Result<Vec<_>, AppError>>()?;
            let players: Vec<u32> = registrations.iter().map(|r| r.player_id).collect();
            Ok(StandingsView::League {
                standings: standings::standings(&players, &matches),
            })
        }
        Format::GroupsKnockout => {
            let matches: Vec<Match> = match_repo::list_stage_matches(pool, id, Stage::Group)
                .await?
                .into_iter()
                .map(Match::try_from)
                .collect::<Result<Vec<_>, AppError>>()?;
            Ok(StandingsView::Groups {
                groups: standings::group_tables(&registration_groups(&registrations), &matches),
            })
        }
        Format::Knockout => Err(AppError::FormatMismatch(tournament.format.to_string())),
    }
}

/// Builds the knockout bracket from the group tables and pays the
/// advancement bonus to every qualifier that has not received it yet.
pub async fn advance_to_knockout(
    pool: &sqlx::SqlitePool,
    notifier: &Notifier,
    id: u32,
) -> Result<KnockoutCreated, AppError> {
    let mut tx = pool.begin().await?;
    let tournament = load_tournament(tx.as_mut(), id).await?;
    if tournament.format != Format::GroupsKnockout {
        return Err(AppError::FormatMismatch(tournament.format.to_string()));
    }
    if bracket_repo::load_bracket(tx.as_mut(), id).await?.is_some() {
        return Err(AppError::KnockoutAlreadyCreated);
    }
    let group_matches: Vec<Match> = match_repo::list_stage_matches(tx.as_mut(), id, Stage::Group)
        .await?
        .into_iter()
        .map(Match::try_from)
        .collect::<Result<Vec<_>, AppError>>()?;
    if group_matches.is_empty() || group_matches.iter().any(|m| !m.status.is_terminal()) {
        return Err(AppError::GroupStageNotComplete);
    }
    let registrations = select_registrations(tx.as_mut(), id).await?;
    let tables = standings::group_tables(&registration_groups(&registrations), &group_matches);
    let advance_count = tournament.advance_count.unwrap_or(0);
    let bracket = advancement_bracket(&tables, advance_count)?;
    let players: Vec<u32> = bracket.slots().iter().flatten().copied().collect();
    bracket_repo::save_bracket(&mut tx, id, &bracket).await?;
    let schedule = bracket.schedule();
    insert_schedule(&mut tx, id, &schedule).await?;

    let population: Vec<Player> = player_repo::list_players(tx.as_mut())
        .await?
        .into_iter()
        .map(Player::from)
        .collect();
    let before: HashMap<u32, Player> = population.iter().map(|p| (p.id, p.clone())).collect();
    let mut ledger = Ledger::new(population);
    let mut bonuses = Vec::new();
    for player_id in players.iter() {
        if bracket_repo::record_advancement(&mut tx, id, *player_id).await? {
            ledger.award(*player_id, ADVANCEMENT_BONUS);
            bonuses.push(*player_id);
        }
    }
    ledger.reclassify();
    for player in ledger.into_players() {
        if before.get(&player.id).is_none_or(|old| !old.same_stats(&player)) {
            player_repo::update_player_stats(&mut tx, &player).await?;
        }
    }
    tournament_repo::mark_tournament_updated(id, &mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        "tournament {}: {} players advanced to the knockout stage",
        id,
        players.len()
    );
    notifier.notify(Event::KnockoutCreated {
        tournament_id: id,
        players: players.clone(),
    });
    Ok(KnockoutCreated {
        players,
        bonuses,
        schedule,
    })
}
