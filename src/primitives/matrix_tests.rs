pub(crate) use super::*;

#[test]
fn test_from_vec() {
    let m = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    assert_eq!(m.shape(), (2, 3));
    assert!((m.get(0, 0) - 1.0).abs() < 1e-6);
    assert!((m.get(1, 2) - 6.0).abs() < 1e-6);
}

#[test]
fn test_from_vec_error() {
    let result = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0]);
    assert!(result.is_err());
}

#[test]
fn test_zeros_usize() {
    let m = Matrix::<usize>::zeros(3, 3);
    assert_eq!(m.shape(), (3, 3));
    assert!(m.as_slice().iter().all(|&x| x == 0));
}

#[test]
fn test_set_then_get() {
    let mut m = Matrix::<f32>::zeros(2, 2);
    m.set(1, 0, 7.5);
    assert!((m.get(1, 0) - 7.5).abs() < 1e-6);
    assert!(m.get(0, 1).abs() < 1e-6);
}

#[test]
fn test_row_and_column() {
    let m = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    assert_eq!(m.column(1), vec![2.0, 5.0]);
}

#[test]
fn test_select_rows_preserves_requested_order() {
    let m = Matrix::from_vec(3, 2, vec![0.0_f32, 0.5, 1.0, 1.5, 2.0, 2.5])
        .expect("test data has correct dimensions: 3*2=6 elements");
    let picked = m.select_rows(&[2, 0]);
    assert_eq!(picked.shape(), (2, 2));
    assert_eq!(picked.row(0), &[2.0, 2.5]);
    assert_eq!(picked.row(1), &[0.0, 0.5]);
}

#[test]
fn test_select_rows_empty() {
    let m = Matrix::from_vec(1, 4, vec![1.0_f32; 4]).expect("1*4=4 elements");
    let picked = m.select_rows(&[]);
    assert_eq!(picked.shape(), (0, 4));
}
