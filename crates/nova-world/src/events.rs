//! Transient world events.
//!
//! Each family (merchant, pirate mercenaries, asteroid impact, resource
//! vein, ancient artifact, space plague) is a small state machine driven by
//! a single `next_transition_at` timestamp:
//!
//! ```text
//! Inactive --start--> Incoming --arrive--> Active/Available --end--> Inactive
//! ```
//!
//! Families without an announcement phase skip `Incoming`. The next start
//! is scheduled as `end + cooldown + (k + 1) * check_interval`, where `k` is
//! the number of failed trigger checks drawn from a geometric distribution.
//! A long offline period therefore costs one draw per occurrence rather than
//! one per check.
//!
//! The black market is not a phase machine: it pays its hourly credits for
//! every whole hour that has elapsed in one transition.

use nova_types::{
    BuildingType, EventPhase, EventTimer, Fleet, HOUR_MS, Notification, NotificationKind,
    PlayerState, Resource, Resources, ShipType, Timestamp, WorldEventKind, WorldEventStates,
};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::catalog::{GameCatalog, fleet_value, to_decimal};
use crate::config::{EventFamilyConfig, WorldEventConfig};
use crate::rng::{geometric_failures, weighted_pick};

/// Drives the world-event state machines of one player.
#[derive(Clone, Copy)]
pub struct WorldEventScheduler<'a> {
    config: &'a WorldEventConfig,
    catalog: &'a dyn GameCatalog,
}

impl std::fmt::Debug for WorldEventScheduler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldEventScheduler")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

const PHASED: [WorldEventKind; 6] = [
    WorldEventKind::Merchant,
    WorldEventKind::PirateMercenaries,
    WorldEventKind::AsteroidImpact,
    WorldEventKind::ResourceVein,
    WorldEventKind::AncientArtifact,
    WorldEventKind::SpacePlague,
];

const fn secs_to_ms(secs: u64) -> u64 {
    secs.saturating_mul(1000)
}

fn timer(events: &WorldEventStates, kind: WorldEventKind) -> Option<&EventTimer> {
    match kind {
        WorldEventKind::Merchant => Some(&events.merchant.timer),
        WorldEventKind::PirateMercenaries => Some(&events.pirates.timer),
        WorldEventKind::AsteroidImpact => Some(&events.asteroid.timer),
        WorldEventKind::ResourceVein => Some(&events.vein.timer),
        WorldEventKind::AncientArtifact => Some(&events.artifact.timer),
        WorldEventKind::SpacePlague => Some(&events.plague.timer),
        WorldEventKind::BlackMarket => None,
    }
}

const fn timer_mut(events: &mut WorldEventStates, kind: WorldEventKind) -> Option<&mut EventTimer> {
    match kind {
        WorldEventKind::Merchant => Some(&mut events.merchant.timer),
        WorldEventKind::PirateMercenaries => Some(&mut events.pirates.timer),
        WorldEventKind::AsteroidImpact => Some(&mut events.asteroid.timer),
        WorldEventKind::ResourceVein => Some(&mut events.vein.timer),
        WorldEventKind::AncientArtifact => Some(&mut events.artifact.timer),
        WorldEventKind::SpacePlague => Some(&mut events.plague.timer),
        WorldEventKind::BlackMarket => None,
    }
}

impl<'a> WorldEventScheduler<'a> {
    /// Create a scheduler over the given tuning and catalog.
    pub const fn new(config: &'a WorldEventConfig, catalog: &'a dyn GameCatalog) -> Self {
        Self { config, catalog }
    }

    const fn family(&self, kind: WorldEventKind) -> Option<&EventFamilyConfig> {
        match kind {
            WorldEventKind::Merchant => Some(&self.config.merchant),
            WorldEventKind::PirateMercenaries => Some(&self.config.pirates),
            WorldEventKind::AsteroidImpact => Some(&self.config.asteroid),
            WorldEventKind::ResourceVein => Some(&self.config.vein),
            WorldEventKind::AncientArtifact => Some(&self.config.artifact),
            WorldEventKind::SpacePlague => Some(&self.config.plague),
            WorldEventKind::BlackMarket => None,
        }
    }

    /// When the next occurrence of `kind` starts, given that the previous one
    /// ended (or the timer was primed) at `after`.
    pub fn schedule_next<R: Rng>(
        &self,
        rng: &mut R,
        kind: WorldEventKind,
        after: Timestamp,
    ) -> Option<Timestamp> {
        let family = self.family(kind)?;
        let interval = secs_to_ms(self.config.check_interval_secs.max(1));
        let failed = geometric_failures(rng, family.trigger_probability);
        Some(
            after
                .saturating_add(secs_to_ms(family.cooldown_secs))
                .saturating_add(interval.saturating_mul(failed.saturating_add(1))),
        )
    }

    /// Give every unprimed timer its first scheduled start.
    pub fn prime<R: Rng>(&self, events: &mut WorldEventStates, now: Timestamp, rng: &mut R) {
        for kind in PHASED {
            let unprimed = timer(events, kind).is_some_and(|t| t.next_transition_at.is_none());
            if unprimed {
                let next = self.schedule_next(rng, kind, now);
                if let Some(t) = timer_mut(events, kind) {
                    *t = EventTimer {
                        phase: EventPhase::Inactive,
                        next_transition_at: next,
                    };
                }
            }
        }
        if events.black_market.next_payout_at.is_none() {
            events.black_market.next_payout_at = Some(now.saturating_add(HOUR_MS));
        }
    }

    /// The earliest pending transition, if any.
    pub fn next_due(&self, events: &WorldEventStates) -> Option<(Timestamp, WorldEventKind)> {
        let phased = PHASED.iter().filter_map(|kind| {
            timer(events, *kind)
                .and_then(|t| t.next_transition_at)
                .map(|at| (at, *kind))
        });
        let market = events
            .black_market
            .next_payout_at
            .map(|at| (at, WorldEventKind::BlackMarket));
        phased.chain(market).min()
    }

    /// Apply the transition of `kind` scheduled at `at`.
    ///
    /// `horizon` is the time the catch-up is advancing to; the black market
    /// pays every hour due up to it.
    pub fn apply<R: Rng>(
        &self,
        kind: WorldEventKind,
        player: &mut PlayerState,
        at: Timestamp,
        horizon: Timestamp,
        rng: &mut R,
    ) -> Vec<Notification> {
        let mut notes = Vec::new();
        if kind == WorldEventKind::BlackMarket {
            self.pay_black_market(player, at, horizon, &mut notes);
            return notes;
        }
        let Some(family) = self.family(kind) else {
            return notes;
        };
        let phase = timer(&player.events, kind).map_or(EventPhase::Inactive, |t| t.phase);
        debug!(?kind, ?phase, at, "world event transition");

        match (phase, kind) {
            (EventPhase::Inactive, WorldEventKind::Merchant | WorldEventKind::AsteroidImpact)
                if family.warning_secs > 0 =>
            {
                set_timer(
                    &mut player.events,
                    kind,
                    EventPhase::Incoming,
                    at.saturating_add(secs_to_ms(family.warning_secs)),
                );
                let text = match kind {
                    WorldEventKind::Merchant => "A merchant convoy is approaching",
                    _ => "An asteroid is on a collision course",
                };
                notes.push(Notification::new(at, NotificationKind::WorldEvent, text));
            }
            (EventPhase::Inactive | EventPhase::Incoming, WorldEventKind::AsteroidImpact) => {
                self.impact_asteroid(player, at, rng, &mut notes);
                self.end_occurrence(kind, &mut player.events, at, rng);
            }
            (EventPhase::Inactive | EventPhase::Incoming, _) => {
                self.begin(kind, player, at, family, rng, &mut notes);
            }
            (EventPhase::Active | EventPhase::Available, _) => {
                self.end_occurrence(kind, &mut player.events, at, rng);
                notes.push(Notification::new(
                    at,
                    NotificationKind::WorldEvent,
                    format!("{kind:?} has ended"),
                ));
            }
        }
        notes
    }

    /// Close the current occurrence of `kind` (by expiry or because the
    /// player consumed it) and schedule the next one.
    pub fn end_occurrence<R: Rng>(
        &self,
        kind: WorldEventKind,
        events: &mut WorldEventStates,
        at: Timestamp,
        rng: &mut R,
    ) {
        match kind {
            WorldEventKind::Merchant => {
                events.merchant.buy_prices = Resources::ZERO;
                events.merchant.sell_prices = Resources::ZERO;
            }
            WorldEventKind::PirateMercenaries => {
                events.pirates.offered_fleet.clear();
                events.pirates.price = Decimal::ZERO;
            }
            WorldEventKind::ResourceVein => {
                events.vein.resource = None;
                events.vein.multiplier = 1.0;
            }
            WorldEventKind::AncientArtifact => events.artifact.credit_reward = Decimal::ZERO,
            WorldEventKind::SpacePlague => events.plague.infected.clear(),
            WorldEventKind::AsteroidImpact | WorldEventKind::BlackMarket => {}
        }
        if let Some(next) = self.schedule_next(rng, kind, at) {
            set_timer(events, kind, EventPhase::Inactive, next);
        }
    }

    fn begin<R: Rng>(
        &self,
        kind: WorldEventKind,
        player: &mut PlayerState,
        at: Timestamp,
        family: &EventFamilyConfig,
        rng: &mut R,
        notes: &mut Vec<Notification>,
    ) {
        let ends = at.saturating_add(secs_to_ms(family.duration_secs));
        let events = &mut player.events;
        let (phase, text) = match kind {
            WorldEventKind::Merchant => {
                let mut jitter = || to_decimal(rng.random_range(0.8..1.2));
                let [metal, crystal, deuterium] = self.config.merchant_prices;
                let buy = Resources::new(
                    to_decimal(metal).saturating_mul(jitter()).round_dp(4),
                    to_decimal(crystal).saturating_mul(jitter()).round_dp(4),
                    to_decimal(deuterium).saturating_mul(jitter()).round_dp(4),
                );
                events.merchant.sell_prices = buy
                    .scaled(to_decimal(self.config.merchant_sell_ratio))
                    .capped(&buy);
                events.merchant.buy_prices = buy;
                (EventPhase::Active, "A merchant is trading in orbit".to_owned())
            }
            WorldEventKind::PirateMercenaries => {
                let mut offer = Fleet::new();
                offer.insert(ShipType::LightFighter, rng.random_range(10..=30));
                offer.insert(ShipType::HeavyFighter, rng.random_range(0..=10));
                offer.insert(ShipType::Cruiser, rng.random_range(0..=3));
                offer.retain(|_, count| *count > 0);
                let value = fleet_value(self.catalog, &offer);
                events.pirates.price = to_decimal(value * self.config.pirate_price_per_unit).ceil();
                events.pirates.offered_fleet = offer;
                (EventPhase::Available, "Pirate mercenaries offer their services".to_owned())
            }
            WorldEventKind::ResourceVein => {
                let resource = weighted_pick(
                    rng,
                    &[(Resource::Metal, 5), (Resource::Crystal, 3), (Resource::Deuterium, 2)],
                )
                .unwrap_or(Resource::Metal);
                events.vein.resource = Some(resource);
                events.vein.multiplier = self.config.vein_multiplier;
                (EventPhase::Active, format!("A rich {resource:?} vein was discovered"))
            }
            WorldEventKind::AncientArtifact => {
                events.artifact.credit_reward = Decimal::from(self.config.artifact_credits);
                (EventPhase::Available, "An ancient artifact was unearthed".to_owned())
            }
            WorldEventKind::SpacePlague => {
                let mut candidates: Vec<ShipType> = ShipType::ALL.to_vec();
                let count = rng.random_range(1..=3_usize);
                let mut infected = Vec::with_capacity(count);
                for _ in 0..count {
                    if candidates.is_empty() {
                        break;
                    }
                    let pick = rng.random_range(0..candidates.len());
                    infected.push(candidates.swap_remove(pick));
                }
                infected.sort_unstable();
                events.plague.infected = infected;
                (EventPhase::Active, "A space plague is spreading through the fleet".to_owned())
            }
            WorldEventKind::AsteroidImpact | WorldEventKind::BlackMarket => return,
        };
        set_timer(events, kind, phase, ends);
        notes.push(Notification::new(at, NotificationKind::WorldEvent, text));
    }

    fn impact_asteroid<R: Rng>(
        &self,
        player: &mut PlayerState,
        at: Timestamp,
        rng: &mut R,
        notes: &mut Vec<Notification>,
    ) {
        let built: Vec<BuildingType> = BuildingType::ALL
            .into_iter()
            .filter(|b| player.building_level(*b) > 0)
            .collect();
        let damage_chance = self.config.asteroid_damage_probability.clamp(0.0, 1.0);
        let damages = !built.is_empty() && rng.random_bool(damage_chance);
        if damages {
            let target = built.get(rng.random_range(0..built.len())).copied();
            if let Some(building) = target {
                let level = player.building_level(building).saturating_sub(1);
                if level == 0 {
                    player.buildings.remove(&building);
                } else {
                    player.buildings.insert(building, level);
                }
                notes.push(Notification::new(
                    at,
                    NotificationKind::WorldEvent,
                    format!("An asteroid struck the {building:?}, now level {level}"),
                ));
                return;
            }
        }
        let max = self.config.asteroid_max_ore;
        let ore = Resources::from_units(rng.random_range(0..=max), rng.random_range(0..=max), 0);
        player.resources = player.resources.plus(&ore);
        notes.push(Notification::new(
            at,
            NotificationKind::WorldEvent,
            format!(
                "An asteroid fell harmlessly, leaving {} metal and {} crystal",
                ore.metal, ore.crystal
            ),
        ));
    }

    fn pay_black_market(
        &self,
        player: &mut PlayerState,
        at: Timestamp,
        horizon: Timestamp,
        notes: &mut Vec<Notification>,
    ) {
        let hours = (horizon.saturating_sub(at) / HOUR_MS).saturating_add(1);
        let paid = Decimal::from(self.config.black_market_credits_per_hour)
            .saturating_mul(Decimal::from(hours));
        player.credits = player.credits.saturating_add(paid);
        let market = &mut player.events.black_market;
        market.total_paid = market.total_paid.saturating_add(paid);
        market.next_payout_at = Some(at.saturating_add(hours.saturating_mul(HOUR_MS)));
        if !paid.is_zero() {
            notes.push(Notification::new(
                at,
                NotificationKind::Trade,
                format!("The black market paid {paid} credits for {hours} hour(s)"),
            ));
        }
    }
}

fn set_timer(
    events: &mut WorldEventStates,
    kind: WorldEventKind,
    phase: EventPhase,
    at: Timestamp,
) {
    if let Some(t) = timer_mut(events, kind) {
        *t = EventTimer {
            phase,
            next_transition_at: Some(at),
        };
    }
}
