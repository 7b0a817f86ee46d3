use criterion::{Criterion, black_box, criterion_group, criterion_main};

use earstaff::engine::mapper::positions_for_mode;
use earstaff::engine::{
    Clef, NoteLetter, Pitch, PitchPositionMapper, SelectionSet, StaffLayout, StaffMode,
    StaffSurface, validate,
};

/// Grand staff laid out the way the terminal renderer does it: two rows per
/// line spacing, bass top line twelve rows under the treble top line.
struct TerminalLikeSurface;

impl StaffSurface for TerminalLikeSurface {
    fn line_y(&self, staff: usize, line: u8) -> Option<f64> {
        (staff < 2).then(|| 6.0 + staff as f64 * 12.0 + line as f64 * 2.0)
    }
    fn line_spacing(&self, staff: usize) -> Option<f64> {
        (staff < 2).then_some(2.0)
    }
    fn staff_x(&self, staff: usize) -> Option<f64> {
        (staff < 2).then_some(8.0)
    }
    fn staff_width(&self, staff: usize) -> Option<f64> {
        (staff < 2).then_some(60.0)
    }
}

fn chord(len: usize, offset: i32) -> Vec<Pitch> {
    (0..len as i32)
        .map(|i| Pitch::from_diatonic_index(21 + offset + i * 2))
        .collect()
}

fn bench_validate(c: &mut Criterion) {
    let target = chord(8, 0);
    let selected = chord(8, 1);

    c.bench_function("validate (8 vs 8 pitches)", |b| {
        b.iter(|| validate(black_box(&target), black_box(&selected)))
    });
}

fn bench_screen_to_position(c: &mut Criterion) {
    let layout = StaffLayout::capture(&TerminalLikeSurface, StaffMode::Grand).unwrap();
    let mapper = PitchPositionMapper::new(layout);
    let rows: Vec<f64> = (0..400).map(|i| i as f64 * 0.1).collect();

    c.bench_function("screen_to_position grand (400 rows)", |b| {
        b.iter(|| {
            rows.iter()
                .map(|&y| mapper.screen_to_position(black_box(20.0), black_box(y)))
                .filter(|pos| pos.clef == Clef::Treble)
                .count()
        })
    });
}

fn bench_positions(c: &mut Criterion) {
    c.bench_function("positions_for_mode grand", |b| {
        b.iter(|| positions_for_mode(black_box(StaffMode::Grand)))
    });
}

fn bench_selection_churn(c: &mut Criterion) {
    let pitches: Vec<Pitch> = (0..7)
        .flat_map(|octave| {
            [NoteLetter::C, NoteLetter::E, NoteLetter::G]
                .into_iter()
                .map(move |letter| Pitch::natural(letter, octave))
        })
        .collect();

    c.bench_function("selection toggle churn (21 pitches x2)", |b| {
        b.iter(|| {
            let mut selection = SelectionSet::new(8, true);
            for pitch in pitches.iter().chain(pitches.iter()) {
                selection.toggle(black_box(*pitch));
            }
            selection
        })
    });
}

criterion_group!(
    benches,
    bench_validate,
    bench_screen_to_position,
    bench_positions,
    bench_selection_churn
);
criterion_main!(benches);
