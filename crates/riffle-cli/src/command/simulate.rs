//! Synthetic game records from truly random shuffles
//!
//! Every simulated deck is shuffled uniformly, so reports built from these
//! records should show unremarkable chances. Useful to sanity check the
//! aggregation and scoring pipeline end to end.

use std::path::PathBuf;

use chrono::{TimeDelta, Utc};
use rand::{Rng, SeedableRng as _, seq::SliceRandom as _};
use rand_pcg::Pcg64Mcg;
use riffle_analysis::{
    game::{CopyObservation, DecklistObservation, GameRecord, HandObservation, LibraryObservation},
    key::{BestOf, DecklistEnd, MAX_HAND_SIZE, ShufflingMode},
};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Number of games to generate
    #[arg(long, default_value_t = 1000)]
    num_games: usize,
    /// Random seed, chosen randomly when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Cards per deck
    #[arg(long, default_value_t = 40)]
    deck_size: u32,
    /// Lands per deck
    #[arg(long, default_value_t = 17)]
    lands: u32,
    /// Copies of the tracked card per deck
    #[arg(long, default_value_t = 4)]
    copies: u32,
    /// Cards in the tracked front-of-decklist segment
    #[arg(long, default_value_t = 5)]
    segment: u32,
    /// Longest revealed library prefix
    #[arg(long, default_value_t = 15)]
    max_revealed: usize,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Card {
    Land,
    Tracked,
    Segment,
    Other,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let special = arg.lands + arg.copies + arg.segment;
    if special > arg.deck_size || arg.deck_size <= MAX_HAND_SIZE {
        anyhow::bail!(
            "deck of {} cards cannot hold {} lands, {} copies and a {} card segment plus a hand",
            arg.deck_size,
            arg.lands,
            arg.copies,
            arg.segment
        );
    }

    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("Simulating {} games with seed {seed}", arg.num_games);
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let deck = build_deck(arg);
    let start = Utc::now() - TimeDelta::minutes(i64::try_from(arg.num_games)?);
    let records = (0..arg.num_games)
        .map(|i| {
            let date = start + TimeDelta::minutes(i64::try_from(i).unwrap_or(i64::MAX));
            simulate_game(arg, &deck, date, &mut rng)
        })
        .collect::<Vec<_>>();

    util::emit_json(&records, arg.output.as_deref())
}

fn build_deck(arg: &SimulateArg) -> Vec<Card> {
    let mut deck = vec![];
    deck.extend((0..arg.lands).map(|_| Card::Land));
    deck.extend((0..arg.copies).map(|_| Card::Tracked));
    deck.extend((0..arg.segment).map(|_| Card::Segment));
    deck.resize(arg.deck_size as usize, Card::Other);
    deck
}

fn count(cards: &[Card], kind: Card) -> u32 {
    u32::try_from(cards.iter().filter(|&&card| card == kind).count()).unwrap_or(u32::MAX)
}

fn flags(cards: &[Card], kind: Card) -> Vec<bool> {
    cards.iter().map(|&card| card == kind).collect()
}

fn simulate_game<R>(
    arg: &SimulateArg,
    deck: &[Card],
    date: chrono::DateTime<Utc>,
    rng: &mut R,
) -> GameRecord
where
    R: Rng,
{
    let mut cards = deck.to_vec();
    cards.shuffle(rng);
    let (hand, library) = cards.split_at(MAX_HAND_SIZE as usize);
    let revealed = &library[..rng.random_range(0..=arg.max_revealed.min(library.len()))];
    let library_size = u32::try_from(library.len()).unwrap_or(u32::MAX);

    let copies = count(library, Card::Tracked);
    let segment = count(library, Card::Segment);
    GameRecord {
        date,
        deck_size: arg.deck_size,
        lands_in_deck: arg.lands,
        best_of: if rng.random_bool(0.5) {
            BestOf::One
        } else {
            BestOf::Three
        },
        shuffling: ShufflingMode::Standard,
        opening_hand: Some(HandObservation {
            hand_size: MAX_HAND_SIZE,
            lands: count(hand, Card::Land),
        }),
        library: Some(LibraryObservation {
            size: library_size,
            lands: count(library, Card::Land),
            revealed: flags(revealed, Card::Land),
        }),
        copies: (copies > 0)
            .then(|| CopyObservation {
                library_size,
                copies,
                revealed: flags(revealed, Card::Tracked),
            })
            .into_iter()
            .collect(),
        decklist: (segment > 0)
            .then(|| DecklistObservation {
                end: DecklistEnd::Front,
                library_size,
                num_cards: segment,
                revealed: flags(revealed, Card::Segment),
            })
            .into_iter()
            .collect(),
    }
}
