use ndarray::{Array2, s};
use ofenet::{
    OfeErr,
    arch::{
        ExtractorStack,
        activations::ActFn,
        blocks::{BlockConfig, BlockStyle, SparsityConfig},
        sparsifier::sparsify,
    },
    config::OfeConfig,
};
use rand::{SeedableRng, rngs::StdRng};

fn random_batch(rng: &mut StdRng, n: usize, width: usize) -> Array2<f32> {
    use rand::Rng;
    Array2::from_shape_simple_fn((n, width), || rng.random_range(-1.0..1.0))
}

/// Two identical rows: batch normalization maps every transformed feature to its offset (zero),
/// so a residual block reduces to `act(pad(x))`.
fn repeated_row(width: usize) -> Array2<f32> {
    let row: Vec<f32> = (0..width).map(|j| j as f32 * 0.25 - 1.).collect();
    let mut x = Array2::zeros((2, width));
    x.row_mut(0).assign(&ndarray::Array1::from(row.clone()));
    x.row_mut(1).assign(&ndarray::Array1::from(row));
    x
}

#[test]
fn forward_blocks_output_their_units() {
    let mut rng = StdRng::seed_from_u64(0);
    let config = BlockConfig::new(32, ActFn::relu()).with_batchnorm(true);
    let mut stack = ExtractorStack::uniform(7, BlockStyle::Forward, config, 3, &mut rng).unwrap();

    let x = random_batch(&mut rng, 16, 7);
    let y = stack.forward(x.view(), true).unwrap();

    assert_eq!(y.dim(), (16, 32));
    assert_eq!(stack.widths(), vec![7, 32, 32, 32]);
}

#[test]
fn residual_with_equal_widths_adds_the_identity() {
    let mut rng = StdRng::seed_from_u64(1);
    let config = BlockConfig::new(8, ActFn::relu()).with_batchnorm(true);
    let mut stack = ExtractorStack::uniform(8, BlockStyle::Residual, config, 1, &mut rng).unwrap();

    let x = repeated_row(8);
    let y = stack.forward(x.view(), true).unwrap();

    assert_eq!(y, x.mapv(|v| v.max(0.)));
}

#[test]
fn residual_pads_the_narrow_identity_on_the_right() {
    let mut rng = StdRng::seed_from_u64(2);
    let config = BlockConfig::new(8, ActFn::Linear).with_batchnorm(true);
    let mut stack = ExtractorStack::uniform(5, BlockStyle::Residual, config, 1, &mut rng).unwrap();

    let x = repeated_row(5);
    let y = stack.forward(x.view(), true).unwrap();

    assert_eq!(y.dim(), (2, 8));
    assert_eq!(y.slice(s![.., ..5]), x);
    assert!(y.slice(s![.., 5..]).iter().all(|&v| v == 0.));
}

#[test]
fn residual_pads_the_narrow_branch_on_the_right() {
    let mut rng = StdRng::seed_from_u64(3);
    let config = BlockConfig::new(3, ActFn::Linear);
    let mut stack = ExtractorStack::uniform(6, BlockStyle::Residual, config, 1, &mut rng).unwrap();

    let x = random_batch(&mut rng, 4, 6);
    let y = stack.forward(x.view(), false).unwrap();

    assert_eq!(y.dim(), (4, 6));
    assert_eq!(y.slice(s![.., 3..]), x.slice(s![.., 3..]));
}

#[test]
fn growing_widths_add_up_with_and_without_sparsity() {
    let mut rng = StdRng::seed_from_u64(4);
    let dense = BlockConfig::new(16, ActFn::swish());
    let sparse = dense.with_sparsity(Some(SparsityConfig {
        index_k: 0.3,
        finalnode: 0.,
    }));

    for config in [dense, sparse] {
        let mut stack =
            ExtractorStack::uniform(12, BlockStyle::Growing, config, 2, &mut rng).unwrap();
        let y = stack
            .forward(random_batch(&mut rng, 8, 12).view(), true)
            .unwrap();

        assert_eq!(stack.widths(), vec![12, 28, 44]);
        assert_eq!(y.dim(), (8, 44));
    }
}

#[test]
fn sparse_growing_stack_end_to_end() {
    let mut rng = StdRng::seed_from_u64(5);
    let config = BlockConfig::new(64, ActFn::relu()).with_sparsity(Some(SparsityConfig {
        index_k: 0.2,
        finalnode: 50.,
    }));
    let mut stack = ExtractorStack::uniform(17, BlockStyle::Growing, config, 3, &mut rng).unwrap();

    let x = random_batch(&mut rng, 32, 17);
    let y = stack.forward(x.view(), true).unwrap();

    assert_eq!(stack.widths(), vec![17, 81, 145, 209]);
    assert_eq!(y.dim(), (32, 209));
    assert!(y.iter().all(|&v| v >= 0.));
    // 209 * 0.2 rounds to 42 winners, the last block's output is already sparse
    assert_eq!(sparsify(y.view(), 42).unwrap(), y);
}

#[test]
fn configuration_errors_surface_before_any_pass() {
    let mut config = OfeConfig::new(17, 6);
    config.block = "attention".to_string();
    assert!(matches!(config.style(), Err(OfeErr::UnknownBlock(_))));

    let mut config = OfeConfig::new(17, 6);
    config.activation = "tf.nn.softplus".to_string();
    assert!(matches!(config.act_fn(), Err(OfeErr::UnknownActivation(_))));

    let mut rng = StdRng::seed_from_u64(6);
    let narrow = BlockConfig::new(2, ActFn::relu()).with_sparsity(Some(SparsityConfig {
        index_k: 0.5,
        finalnode: 0.,
    }));
    assert!(matches!(
        ExtractorStack::uniform(3, BlockStyle::Growing, narrow, 1, &mut rng),
        Err(OfeErr::SparsityExceedsWidth { .. })
    ));
}

#[test]
fn sparsity_is_ignored_outside_growing_blocks() {
    let mut rng = StdRng::seed_from_u64(7);
    let config = BlockConfig::new(4, ActFn::relu()).with_sparsity(Some(SparsityConfig {
        index_k: 0.5,
        finalnode: 0.,
    }));

    for style in [BlockStyle::Forward, BlockStyle::Residual] {
        assert!(ExtractorStack::uniform(3, style, config, 2, &mut rng).is_ok());
    }
}

#[test]
fn reprojected_stack_widens_only_where_sparsity_fires() {
    let mut rng = StdRng::seed_from_u64(8);
    let config = BlockConfig::new(16, ActFn::relu()).with_sparsity(Some(SparsityConfig {
        index_k: 0.2,
        finalnode: 40.,
    }));
    let mut stack =
        ExtractorStack::uniform(10, BlockStyle::GrowingReprojected, config, 3, &mut rng).unwrap();

    // 10 -> 26 bypasses, 26 -> 42 fires and is reprojected to 46, 46 -> 62 fires again
    assert_eq!(stack.widths(), vec![10, 26, 46, 46]);
    let y = stack
        .forward(random_batch(&mut rng, 4, 10).view(), true)
        .unwrap();
    assert_eq!(y.dim(), (4, 46));
}

#[test]
fn batch_size_is_preserved_for_every_style() {
    let mut rng = StdRng::seed_from_u64(9);
    let config = BlockConfig::new(8, ActFn::Tanh).with_batchnorm(true);

    for style in [
        BlockStyle::Forward,
        BlockStyle::Residual,
        BlockStyle::Growing,
        BlockStyle::GrowingReprojected,
    ] {
        let mut stack = ExtractorStack::uniform(5, style, config, 2, &mut rng).unwrap();
        for n in [1, 3, 64] {
            let y = stack
                .forward(random_batch(&mut rng, n, 5).view(), false)
                .unwrap();
            assert_eq!(y.nrows(), n, "{style} with batch {n}");
        }
    }
}
