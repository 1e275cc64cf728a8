use hyperdist::algs::communicator::{CommTag, Communicator, MailboxComm, NoComm, Wait};
use serial_test::serial;

// `MailboxComm::new` ranks share one process-wide mailbox; tests using it run serially.

#[test]
#[serial]
fn mailbox_round_trip() {
    let tag = CommTag(0x1000);
    let c0 = MailboxComm::new(0, 2);
    let c1 = MailboxComm::new(1, 2);

    let msg = b"hello";
    c0.isend(1, tag.as_u16(), msg).wait();

    let mut buf = [0u8; 5];
    let got = c1.irecv(0, tag.as_u16(), &mut buf).wait().unwrap();
    assert_eq!(&got, msg);
}

#[test]
#[serial]
fn mailbox_fifo_order() {
    let tag = CommTag(0x1001);
    let c0 = MailboxComm::new(0, 2);
    let c1 = MailboxComm::new(1, 2);

    for i in 0..10u8 {
        c0.isend(1, tag.as_u16(), &[i]);
    }
    let mut out = Vec::new();
    for _ in 0..10 {
        let mut b = [0u8; 1];
        out.push(c1.irecv(0, tag.as_u16(), &mut b).wait().unwrap()[0]);
    }
    assert_eq!(out, (0u8..10u8).collect::<Vec<_>>());
}

#[test]
#[serial]
fn receive_returns_the_whole_message() {
    let tag = CommTag(0x1002);
    let c0 = MailboxComm::new(0, 2);
    let c1 = MailboxComm::new(1, 2);

    c0.isend(1, tag.as_u16(), &[1, 2, 3, 4]);
    let mut small = [0u8; 2];
    let got = c1.irecv(0, tag.as_u16(), &mut small).wait().unwrap();
    assert_eq!(got, vec![1, 2, 3, 4]);
}

#[test]
fn private_groups_do_not_share_messages() {
    let a = MailboxComm::group(2);
    let b = MailboxComm::group(2);
    a[0].isend(1, 7, &[1]);
    assert_eq!(a[1].pending(), 1);
    assert_eq!(b[1].pending(), 0);
    assert!(b[1].trace().is_empty());
}

#[test]
fn no_comm_is_a_group_of_one() {
    let c = NoComm;
    assert_eq!((c.rank(), c.size()), (0, 1));
    let mut b = [0u8; 1];
    assert!(c.irecv(0, 1, &mut b).wait().is_none());
}
