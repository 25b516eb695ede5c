//! The player action API.
//!
//! [`apply_action`] validates a [`PlayerAction`] against an already
//! advanced state and returns the new state with its notifications. The
//! input is never touched: on error the caller simply keeps what it had.
//!
//! ## Dispatch flow
//!
//! 1. Clone the state and derive the action generator from
//!    (world seed, player, `now`).
//! 2. Run the handler for the action; handlers check every precondition
//!    before mutating.
//! 3. Return the clone together with the handler's notifications.

use nova_types::{
    ActiveBoost, ArtifactChoice, BoostId, EntityId, EventPhase, GlobalState, MessageId,
    Notification, NotificationKind, PlayerAction, PlayerState, Resource, ResearchType,
    Resources, TradeSide, Timestamp, WorldEventKind, merge_counts,
};
use nova_world::catalog::requirements_met;
use nova_world::production;
use nova_world::rng::{seeded, tag};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::ActionError;
use crate::mail;
use crate::missions::{recall_fleet, send_fleet};
use crate::queue::enqueue;
use crate::rules::Ruleset;

/// A successfully applied action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// State after the action.
    pub state: PlayerState,
    /// What happened, in order.
    pub notifications: Vec<Notification>,
}

/// Apply `action` at `now` to a state that has already been advanced to
/// `now`.
pub fn apply_action(
    rules: &Ruleset<'_>,
    state: &PlayerState,
    global: &GlobalState,
    action: PlayerAction,
    now: Timestamp,
) -> Result<ActionOutcome, ActionError> {
    let mut next = state.clone();
    let mut rng = seeded(&[global.seed, state.id.seed(), now, tag::ACTION]);

    let notifications = match action {
        PlayerAction::AddToQueue {
            entity,
            kind,
            amount,
        } => vec![enqueue(rules, &mut next, entity, kind, amount, now)?],
        PlayerAction::SendFleet {
            fleet,
            target,
            mission_type,
        } => vec![send_fleet(
            rules,
            &mut next,
            global,
            fleet,
            target,
            mission_type,
            now,
            &mut rng,
        )?],
        PlayerAction::RecallFleet { mission_id } => vec![recall_fleet(&mut next, mission_id, now)?],
        PlayerAction::MarkMessageRead { id } => {
            mark_read(&mut next, id)?;
            Vec::new()
        }
        PlayerAction::DeleteMessage { id } => {
            delete_message(&mut next, id)?;
            Vec::new()
        }
        PlayerAction::TradeMerchant {
            resource,
            amount,
            side,
        } => vec![trade(rules, &mut next, resource, amount, side, now)?],
        PlayerAction::HirePirates => vec![hire_pirates(rules, &mut next, now, &mut rng)?],
        PlayerAction::ArtifactChoice { choice } => {
            vec![claim_artifact(rules, &mut next, choice, now, &mut rng)?]
        }
        PlayerAction::ActivateBoost { boost_id } => vec![activate_boost(&mut next, boost_id, now)?],
    };

    debug!(player = %state.id, now, notes = notifications.len(), "action applied");
    Ok(ActionOutcome {
        state: next,
        notifications,
    })
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

fn mark_read(state: &mut PlayerState, id: MessageId) -> Result<(), ActionError> {
    let message = state
        .messages
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| ActionError::unknown(format!("no message {id}")))?;
    message.read = true;
    Ok(())
}

fn delete_message(state: &mut PlayerState, id: MessageId) -> Result<(), ActionError> {
    let idx = state
        .messages
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| ActionError::unknown(format!("no message {id}")))?;
    state.messages.remove(idx);
    Ok(())
}

// ---------------------------------------------------------------------------
// World-event interactions
// ---------------------------------------------------------------------------

fn trade(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    resource: Resource,
    amount: Decimal,
    side: TradeSide,
    now: Timestamp,
) -> Result<Notification, ActionError> {
    if state.events.merchant.timer.phase != EventPhase::Active {
        return Err(ActionError::EventUnavailable(WorldEventKind::Merchant));
    }
    if amount <= Decimal::ZERO {
        return Err(ActionError::InvalidAmount {
            reason: format!("trade amount must be positive, got {amount}"),
        });
    }
    let mut goods = Resources::ZERO;
    *goods.get_mut(resource) = amount;

    match side {
        TradeSide::Buy => {
            let capacity = production::capacity(rules.catalog, &state.buildings).get(resource);
            let free = capacity.saturating_sub(state.resources.get(resource)).max(Decimal::ZERO);
            if amount > free {
                return Err(ActionError::InvalidAmount {
                    reason: format!(
                        "only {free} {resource:?} fits in storage, asked for {amount}"
                    ),
                });
            }
            let price = state.events.merchant.buy_prices.get(resource);
            let total = amount.saturating_mul(price).round_dp(4);
            if state.credits < total {
                return Err(ActionError::InsufficientCredits {
                    needed: total,
                    available: state.credits,
                });
            }
            state.credits = state.credits.saturating_sub(total);
            state.resources = state.resources.plus(&goods);
            info!(player = %state.id, ?resource, %amount, %total, "bought from merchant");
            Ok(Notification::new(
                now,
                NotificationKind::Trade,
                format!("Bought {amount} {resource:?} for {total} credits"),
            ))
        }
        TradeSide::Sell => {
            let Some(rest) = state.resources.checked_minus(&goods) else {
                return Err(ActionError::InsufficientResources {
                    needed: goods,
                    available: state.resources,
                });
            };
            let price = state.events.merchant.sell_prices.get(resource);
            let total = amount.saturating_mul(price).round_dp(4);
            state.resources = rest;
            state.credits = state.credits.saturating_add(total);
            info!(player = %state.id, ?resource, %amount, %total, "sold to merchant");
            Ok(Notification::new(
                now,
                NotificationKind::Trade,
                format!("Sold {amount} {resource:?} for {total} credits"),
            ))
        }
    }
}

fn hire_pirates<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    now: Timestamp,
    rng: &mut R,
) -> Result<Notification, ActionError> {
    let pirates = &state.events.pirates;
    if pirates.timer.phase != EventPhase::Available || pirates.offered_fleet.is_empty() {
        return Err(ActionError::EventUnavailable(WorldEventKind::PirateMercenaries));
    }
    if state.credits < pirates.price {
        return Err(ActionError::InsufficientCredits {
            needed: pirates.price,
            available: state.credits,
        });
    }
    let price = pirates.price;
    let hired = pirates.offered_fleet.clone();
    state.credits = state.credits.saturating_sub(price);
    merge_counts(&mut state.fleet, &hired);
    rules
        .scheduler()
        .end_occurrence(WorldEventKind::PirateMercenaries, &mut state.events, now, rng);

    let summary = hired
        .iter()
        .map(|(ship, count)| format!("{count} {ship:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    mail::post(
        state,
        rules.economy.message_cap,
        rng,
        now,
        mail::general(
            "Mercenaries hired",
            format!("{summary} joined your fleet for {price} credits"),
        ),
    );
    Ok(Notification::new(
        now,
        NotificationKind::WorldEvent,
        format!("Hired pirate mercenaries: {summary}"),
    ))
}

fn claim_artifact<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    choice: ArtifactChoice,
    now: Timestamp,
    rng: &mut R,
) -> Result<Notification, ActionError> {
    if state.events.artifact.timer.phase != EventPhase::Available {
        return Err(ActionError::EventUnavailable(WorldEventKind::AncientArtifact));
    }
    let text = match choice {
        ArtifactChoice::Research => {
            let unlocked: Vec<ResearchType> = ResearchType::ALL
                .into_iter()
                .filter(|r| {
                    requirements_met(
                        &rules.catalog.requirements(EntityId::Research(*r)),
                        &state.buildings,
                        &state.research,
                    )
                })
                .collect();
            let tech = if unlocked.is_empty() {
                ResearchType::EnergyTechnology
            } else {
                unlocked
                    .get(rng.random_range(0..unlocked.len()))
                    .copied()
                    .unwrap_or(ResearchType::EnergyTechnology)
            };
            let level = state.research_level(tech).saturating_add(1);
            state.research.insert(tech, level);
            format!("The artifact revealed {tech:?} level {level}")
        }
        ArtifactChoice::Credits => {
            let reward = state.events.artifact.credit_reward;
            state.credits = state.credits.saturating_add(reward);
            format!("The artifact sold for {reward} credits")
        }
    };
    rules
        .scheduler()
        .end_occurrence(WorldEventKind::AncientArtifact, &mut state.events, now, rng);
    info!(player = %state.id, ?choice, "artifact claimed");
    Ok(Notification::new(now, NotificationKind::WorldEvent, text))
}

// ---------------------------------------------------------------------------
// Boosts
// ---------------------------------------------------------------------------

fn activate_boost(
    state: &mut PlayerState,
    id: BoostId,
    now: Timestamp,
) -> Result<Notification, ActionError> {
    let idx = state
        .inventory
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| ActionError::unknown(format!("no boost {id} in inventory")))?;
    let boost = state.inventory.remove(idx);
    let expires_at = now.saturating_add(boost.duration_ms);
    let active = state
        .active_boosts
        .entry(boost.boost_type)
        .or_insert(ActiveBoost {
            level: 0,
            expires_at: 0,
        });
    active.level = active.level.max(boost.level);
    active.expires_at = active.expires_at.max(expires_at);
    Ok(Notification::new(
        now,
        NotificationKind::Boost,
        format!(
            "{:?} boost level {} active until {}",
            boost.boost_type, active.level, active.expires_at
        ),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_types::{
        Boost, BoostType, BuildingType, EventTimer, Fleet, Message, MessageBody, QueueKind,
        ShipType, count_of,
    };

    use super::*;
    use crate::test_support::{Fixture, global_with_home, rich_player};

    fn open(timer: &mut EventTimer, phase: EventPhase) {
        timer.phase = phase;
        timer.next_transition_at = Some(10_000_000);
    }

    #[test]
    fn rejected_action_leaves_state_untouched() {
        let fx = Fixture::default();
        let player = rich_player();
        let global = global_with_home(&player);
        let err = apply_action(
            &fx.rules(),
            &player,
            &global,
            PlayerAction::HirePirates,
            1_000,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::EventUnavailable(WorldEventKind::PirateMercenaries));
    }

    #[test]
    fn queue_action_debits_resources() {
        let fx = Fixture::default();
        let player = rich_player();
        let global = global_with_home(&player);
        let out = apply_action(
            &fx.rules(),
            &player,
            &global,
            PlayerAction::AddToQueue {
                entity: EntityId::Building(BuildingType::MetalMine),
                kind: QueueKind::Building,
                amount: 1,
            },
            1_000,
        )
        .unwrap();
        assert_eq!(out.state.queue.len(), 1);
        assert!(out.state.resources.metal < player.resources.metal);
        assert_eq!(out.notifications.len(), 1);
    }

    #[test]
    fn merchant_trades_both_ways() {
        let fx = Fixture::default();
        let mut player = rich_player();
        player.credits = Decimal::from(1_000);
        open(&mut player.events.merchant.timer, EventPhase::Active);
        player.events.merchant.buy_prices = Resources::from_units(2, 3, 4);
        player.events.merchant.sell_prices = Resources::from_units(1, 1, 2);
        player.resources = Resources::from_units(100, 100, 100);
        let global = global_with_home(&player);

        let buy = PlayerAction::TradeMerchant {
            resource: Resource::Metal,
            amount: Decimal::from(300),
            side: TradeSide::Buy,
        };
        let out = apply_action(&fx.rules(), &player, &global, buy, 5).unwrap();
        assert_eq!(out.state.credits, Decimal::from(400));
        assert_eq!(out.state.resources.metal, Decimal::from(400));

        let sell = PlayerAction::TradeMerchant {
            resource: Resource::Deuterium,
            amount: Decimal::from(50),
            side: TradeSide::Sell,
        };
        let out = apply_action(&fx.rules(), &out.state, &global, sell, 6).unwrap();
        assert_eq!(out.state.credits, Decimal::from(500));
        assert_eq!(out.state.resources.deuterium, Decimal::from(50));

        let broke = PlayerAction::TradeMerchant {
            resource: Resource::Crystal,
            amount: Decimal::from(1_000),
            side: TradeSide::Buy,
        };
        assert!(matches!(
            apply_action(&fx.rules(), &out.state, &global, broke, 7),
            Err(ActionError::InsufficientCredits { .. })
        ));
        let zero = PlayerAction::TradeMerchant {
            resource: Resource::Crystal,
            amount: Decimal::ZERO,
            side: TradeSide::Sell,
        };
        assert!(matches!(
            apply_action(&fx.rules(), &out.state, &global, zero, 7),
            Err(ActionError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn merchant_buy_must_fit_in_storage() {
        let fx = Fixture::default();
        let rules = fx.rules();
        let mut player = rich_player();
        player.credits = Decimal::from(100_000);
        open(&mut player.events.merchant.timer, EventPhase::Active);
        player.events.merchant.buy_prices = Resources::from_units(1, 1, 1);
        let cap = production::capacity(rules.catalog, &player.buildings).metal;
        player.resources.metal = cap.saturating_sub(Decimal::from(1_000));
        let global = global_with_home(&player);

        let too_much = PlayerAction::TradeMerchant {
            resource: Resource::Metal,
            amount: Decimal::from(50_000),
            side: TradeSide::Buy,
        };
        assert!(matches!(
            apply_action(&rules, &player, &global, too_much, 5),
            Err(ActionError::InvalidAmount { .. })
        ));

        let fits = PlayerAction::TradeMerchant {
            resource: Resource::Metal,
            amount: Decimal::from(1_000),
            side: TradeSide::Buy,
        };
        let out = apply_action(&rules, &player, &global, fits, 6).unwrap();
        assert_eq!(out.state.credits, Decimal::from(99_000));
        assert_eq!(out.state.resources.metal, cap);
    }

    #[test]
    fn hiring_pirates_adds_ships_and_closes_offer() {
        let fx = Fixture::default();
        let mut player = rich_player();
        player.credits = Decimal::from(10_000);
        open(&mut player.events.pirates.timer, EventPhase::Available);
        player.events.pirates.offered_fleet = Fleet::from([(ShipType::LightFighter, 12)]);
        player.events.pirates.price = Decimal::from(2_500);
        let global = global_with_home(&player);

        let out =
            apply_action(&fx.rules(), &player, &global, PlayerAction::HirePirates, 50).unwrap();
        assert_eq!(count_of(&out.state.fleet, &ShipType::LightFighter), 12);
        assert_eq!(out.state.credits, Decimal::from(7_500));
        assert_eq!(out.state.events.pirates.timer.phase, EventPhase::Inactive);
        assert!(out.state.events.pirates.offered_fleet.is_empty());
        assert_eq!(out.state.messages.len(), 1);
    }

    #[test]
    fn artifact_credits_are_paid_once() {
        let fx = Fixture::default();
        let mut player = rich_player();
        open(&mut player.events.artifact.timer, EventPhase::Available);
        player.events.artifact.credit_reward = Decimal::from(750);
        let global = global_with_home(&player);

        let claim = PlayerAction::ArtifactChoice {
            choice: ArtifactChoice::Credits,
        };
        let out = apply_action(&fx.rules(), &player, &global, claim.clone(), 9).unwrap();
        assert_eq!(out.state.credits, Decimal::from(750));
        assert_eq!(
            apply_action(&fx.rules(), &out.state, &global, claim, 10).unwrap_err(),
            ActionError::EventUnavailable(WorldEventKind::AncientArtifact)
        );
    }

    #[test]
    fn artifact_research_raises_an_unlocked_tech() {
        let fx = Fixture::default();
        let mut player = rich_player();
        open(&mut player.events.artifact.timer, EventPhase::Available);
        let global = global_with_home(&player);
        let claim = PlayerAction::ArtifactChoice {
            choice: ArtifactChoice::Research,
        };
        let out = apply_action(&fx.rules(), &player, &global, claim, 9).unwrap();
        let gained: u32 = out.state.research.values().sum();
        assert_eq!(gained, 1);
    }

    #[test]
    fn boost_activation_moves_out_of_inventory() {
        let fx = Fixture::default();
        let mut player = rich_player();
        let id = BoostId::from_u128(5);
        player.inventory.push(Boost {
            id,
            boost_type: BoostType::Production,
            level: 2,
            duration_ms: 3_600_000,
        });
        let global = global_with_home(&player);
        let out = apply_action(
            &fx.rules(),
            &player,
            &global,
            PlayerAction::ActivateBoost { boost_id: id },
            1_000,
        )
        .unwrap();
        assert!(out.state.inventory.is_empty());
        let active = out.state.active_boosts.get(&BoostType::Production).unwrap();
        assert_eq!((active.level, active.expires_at), (2, 3_601_000));

        let again = apply_action(
            &fx.rules(),
            &out.state,
            &global,
            PlayerAction::ActivateBoost { boost_id: id },
            2_000,
        );
        assert!(matches!(again, Err(ActionError::UnknownEntity { .. })));
    }

    #[test]
    fn message_maintenance() {
        let fx = Fixture::default();
        let mut player = rich_player();
        let id = MessageId::from_u128(77);
        player.messages.push(Message {
            id,
            timestamp: 0,
            read: false,
            body: mail::general("hello", "world"),
        });
        let global = global_with_home(&player);

        let read = PlayerAction::MarkMessageRead { id };
        let out = apply_action(&fx.rules(), &player, &global, read, 1).unwrap();
        assert!(out.state.messages.first().unwrap().read);
        let delete = PlayerAction::DeleteMessage { id };
        let out = apply_action(&fx.rules(), &out.state, &global, delete, 2).unwrap();
        assert!(out.state.messages.is_empty());
        assert!(matches!(
            apply_action(&fx.rules(), &out.state, &global, PlayerAction::DeleteMessage { id }, 3),
            Err(ActionError::UnknownEntity { .. })
        ));
        assert!(matches!(
            player.messages.first().map(|m| &m.body),
            Some(MessageBody::General { .. })
        ));
    }
}
