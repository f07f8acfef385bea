use anyhow::{Context, Result, anyhow, ensure};
use dynarray::cli::Cli;
use dynarray::{ArrayError, DynamicArray, dynarray};
use log::info;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if cli.test {
        println!("Running scenario checks...");
        run_all_tests().context("Scenario checks failed")?;
        println!("All scenarios passed!");
    } else {
        run_trace(cli.pushes);
    }

    Ok(())
}

/// Pushes `pushes` values and pops them all again, printing the block size
/// after every step.
fn run_trace(pushes: usize) {
    let mut arr = DynamicArray::new();
    println!("{:>6} {:>8} {:>8}", "op", "len", "cap");
    for i in 0..pushes {
        arr.push(i);
        println!("{:>6} {:>8} {:>8}", "push", arr.len(), arr.capacity());
    }
    while arr.pop().is_some() {
        println!("{:>6} {:>8} {:>8}", "pop", arr.len(), arr.capacity());
    }
}

fn run_all_tests() -> Result<()> {
    println!("--- Growth ---");
    check_growth()?;
    println!("--- Pop shrink ---");
    check_pop_shrink()?;
    println!("--- Resize ---");
    check_resize()?;
    println!("--- Assign ---");
    check_assign()?;
    println!("--- Clone independence ---");
    check_clone()?;
    println!("--- Move ---");
    check_move()?;
    println!("--- Checked access ---");
    check_at()?;
    Ok(())
}

fn check_growth() -> Result<()> {
    let mut arr = DynamicArray::new();
    let mut caps = Vec::new();
    for i in 1..=5 {
        arr.try_push(i)?;
        caps.push(arr.capacity());
    }
    info!("capacity trace: {caps:?}");
    ensure!(caps == [1, 2, 4, 4, 8], "unexpected capacity trace {caps:?}");
    ensure!(arr == [1, 2, 3, 4, 5], "unexpected contents {arr:?}");
    Ok(())
}

fn check_pop_shrink() -> Result<()> {
    let mut arr: DynamicArray<u32> = (0..16).collect();
    ensure!(arr.capacity() == 16, "collect should reserve exactly 16 slots");
    while arr.capacity() == 16 {
        arr.pop();
    }
    ensure!(
        arr.len() == 3 && arr.capacity() == 3,
        "pop below a quarter left len {} cap {}",
        arr.len(),
        arr.capacity()
    );
    Ok(())
}

fn check_resize() -> Result<()> {
    let mut arr = dynarray![1, 2, 3, 4];
    arr.try_resize(2, 0)?;
    ensure!(arr == [1, 2], "shrink kept {arr:?}");
    arr.try_resize(5, 9)?;
    ensure!(arr == [1, 2, 9, 9, 9], "grow produced {arr:?}");
    ensure!(arr.capacity() == 5, "grow should size the block exactly");
    Ok(())
}

fn check_assign() -> Result<()> {
    let mut arr = dynarray!["old"; 10];
    arr.try_assign(3, "new")?;
    ensure!(arr == ["new"; 3] && arr.capacity() == 3, "assign produced {arr:?}");
    arr.try_assign_range(["a", "b"].iter().copied())?;
    ensure!(arr == ["a", "b"], "assign_range produced {arr:?}");
    Ok(())
}

fn check_clone() -> Result<()> {
    let original = dynarray![String::from("a"), String::from("b")];
    let mut copy = original.clone();
    copy[0].push('!');
    ensure!(original[0] == "a" && copy[0] == "a!", "clone shares storage");
    Ok(())
}

fn check_move() -> Result<()> {
    let mut source = dynarray![1u64, 2, 3];
    let before = source.data();
    let target = source.take();
    ensure!(target.data() == before, "move reallocated");
    ensure!(source.is_empty() && source.capacity() == 0, "source not emptied");
    Ok(())
}

fn check_at() -> Result<()> {
    let arr = DynamicArray::from_elem(3, "x");
    match arr.at(5) {
        Err(ArrayError::OutOfRange { index: 5, len: 3 }) => Ok(()),
        other => Err(anyhow!("at(5) returned {other:?}")),
    }
}
