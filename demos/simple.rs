//! Simple usage example

use lap_mpmc::Queue;
use std::sync::Arc;
use std::thread;

fn main() {
    println!("lap_mpmc - Simple Example\n");

    // 16 slots, 14 of them usable
    let queue = Arc::new(Queue::<String>::new(16));

    let producer_queue = queue.clone();
    let consumer_queue = queue.clone();

    let producer = thread::spawn(move || {
        for i in 0..10 {
            let mut message = format!("Message {}", i);
            println!("Sending: {}", message);

            // Full or contended: take the value back and retry
            while let Err(err) = producer_queue.put(message) {
                message = err.into_inner();
                std::hint::spin_loop();
            }

            thread::sleep(std::time::Duration::from_millis(100));
        }
        println!("Producer finished!");
    });

    let consumer = thread::spawn(move || {
        let mut received = 0;
        while received < 10 {
            match consumer_queue.get() {
                Ok((Some(message), remaining)) => {
                    println!("Received: {} ({} left)", message, remaining);
                    received += 1;
                }
                Ok((None, _)) => println!("Received a placeholder"),
                Err(_) => std::hint::spin_loop(),
            }
        }
        println!("Consumer finished!");
    });

    producer.join().unwrap();
    consumer.join().unwrap();

    println!("\n{}", queue.info());
}
