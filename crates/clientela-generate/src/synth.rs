//! Record synthesis: one customer per call, drawn from the reference data.

use rand::Rng;

use clientela_core::{AGE_RANGE, Cedula, Pool, Record, ReferenceData, Sex};

use crate::email::derive_email;
use crate::model::DomainPolicy;

/// Extra draws allowed when the second name of a pair repeats the first.
/// After that the repeat is kept.
pub const REDRAW_ATTEMPTS: usize = 5;

/// Assemble one record. Consumes randomness only; no other side effects.
pub fn synthesize<R: Rng + ?Sized>(
    reference: &ReferenceData,
    domain: &DomainPolicy,
    rng: &mut R,
) -> Record {
    let sex = Sex::random(rng);
    let (given_name1, given_name2) = draw_pair(reference.given_names(sex), rng);
    let (surname1, surname2) = draw_pair(reference.surnames(), rng);
    let location = reference.locations().sample(rng).clone();
    let age = rng.random_range(AGE_RANGE);
    let cedula = Cedula::generate(rng);
    let domain = domain.resolve(rng);
    let email = derive_email(&given_name1, &surname1, domain, rng);

    Record {
        cedula,
        given_name1,
        given_name2,
        surname1,
        surname2,
        sex,
        location,
        age,
        email,
    }
}

/// Two draws with replacement; best-effort avoidance of a case-insensitive
/// repeat.
fn draw_pair<R: Rng + ?Sized>(pool: &Pool<String>, rng: &mut R) -> (String, String) {
    let first = pool.sample(rng);
    let mut second = pool.sample(rng);
    let mut attempts = 0;
    while attempts < REDRAW_ATTEMPTS && eq_ignore_case(first, second) {
        second = pool.sample(rng);
        attempts += 1;
    }
    (first.clone(), second.clone())
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}
