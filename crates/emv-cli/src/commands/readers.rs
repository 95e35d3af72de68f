use emv_card::CardReader;

pub fn cmd_readers() {
    let reader = match CardReader::new() {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to establish PC/SC context: {}", err);
            return;
        }
    };

    match reader.list_readers() {
        Ok(readers) if readers.is_empty() => println!("No readers found"),
        Ok(readers) => {
            for (i, name) in readers.iter().enumerate() {
                println!("{}: {}", i, name);
            }
        }
        Err(err) => eprintln!("Failed to list readers: {}", err),
    }
}
