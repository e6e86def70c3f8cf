use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lyricist::{
    Classifier, Corpus, GridSearch, Hyperparameters, NgramRange, SearchConfig, TextNormalizer,
};

const LINES: [(&str, &str); 12] = [
    ("Eels", "All I need is a mirror"),
    ("Eels", "Mirror, mirror, tell me why"),
    ("Eels", "Life is hard and so am I"),
    ("Eels", "I need some novocaine for the soul"),
    ("Rage Against the Machine", "Bulls on parade"),
    ("Rage Against the Machine", "Rally round the family with a pocket full of shells"),
    ("Rage Against the Machine", "Killing in the name of"),
    ("Rage Against the Machine", "Now you do what they told ya"),
    ("Adele", "Hello from the other side"),
    ("Adele", "We could have had it all, rolling in the deep"),
    ("Adele", "Never mind, I'll find someone like you"),
    ("Adele", "Set fire to the rain"),
];

fn setup_benchmark_corpus() -> Corpus {
    let normalizer = TextNormalizer::new();
    let (docs, labels): (Vec<String>, Vec<String>) = LINES
        .iter()
        .map(|(artist, line)| (normalizer.normalize(line), artist.to_string()))
        .unzip();
    Corpus::new(docs, labels).unwrap()
}

fn setup_benchmark_classifier(corpus: &Corpus) -> Classifier {
    Classifier::builder()
        .with_ngram_range(NgramRange::new(1, 2))
        .fit(corpus.documents(), corpus.labels())
        .unwrap()
}

fn bench_normalization(c: &mut Criterion) {
    let normalizer = TextNormalizer::new();
    let mut group = c.benchmark_group("Normalization");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("single_line", |b| b.iter(|| {
        normalizer.normalize(black_box("We could've had it all, rolling in the deep"))
    }));

    let batch: Vec<&str> = LINES.iter().map(|(_, line)| *line).cycle().take(500).collect();
    group.bench_function("batch_500", |b| b.iter(|| {
        normalizer.normalize_all(black_box(&batch))
    }));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let corpus = setup_benchmark_corpus();
    let classifier = setup_benchmark_classifier(&corpus);
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("known_words", |b| b.iter(|| {
        classifier.predict_with_confidence(black_box("need mirror hard soul"))
    }));

    group.bench_function("unknown_words", |b| b.iter(|| {
        classifier.predict_with_confidence(black_box("zyzzyva quixotic"))
    }));

    group.finish();
}

fn bench_fitting(c: &mut Criterion) {
    let corpus = setup_benchmark_corpus();
    let mut group = c.benchmark_group("Fitting");
    group.sample_size(20);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("single_fit", |b| b.iter(|| {
        setup_benchmark_classifier(black_box(&corpus))
    }));

    // One candidate per thread count keeps the grid small enough to iterate on.
    for threads in [1, 4] {
        let config = SearchConfig {
            folds: 2,
            threads,
            ..SearchConfig::single(Hyperparameters::default())
        };
        group.bench_function(format!("grid_search_{}_threads", threads), |b| b.iter(|| {
            GridSearch::new(config.clone()).fit(black_box(&corpus)).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_normalization,
    bench_prediction,
    bench_fitting
);
criterion_main!(benches);
