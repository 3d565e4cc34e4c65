/*!

This is the long-form manual for `vote_geo` and `rollmap`.

## Input feeds

The following feeds are supported:
* Senate roll-call votes (senate.gov LIS XML)
* House roll-call votes (Clerk EVS XML)
* House member list (Clerk `MemberData.xml`), to resolve member ids

### Senate

One XML document per roll call, at
`https://www.senate.gov/legislative/LIS/roll_call_votes/vote{congress}{session}/vote_{congress:03}_{session}_{roll:05}.xml`.
Each `members/member` entry carries a `state` and a `vote_cast` element. Entries without a state are skipped.
A missing `vote_cast` counts as Not Voting.

### House

One XML document per roll call, at `https://clerk.house.gov/evs/{year}/roll{roll:03}.xml`. The year is
`1789 + (congress - 1) * 2` for the first session, plus one for the second session. Older
years use four digits for the roll number, so `roll{roll:04}.xml` is tried when the first URL fails.

Each `recorded-vote` entry has a `legislator` element and a `vote` element. The legislator is identified
either by `state` and `district` attributes, or by a `name-id` attribute (the bioguide id). In the second
case the member list is needed to find the district.

### Member list

The `member` entries of the Clerk member list map a `bioguideID` to a `statedistrict` token such as `NY10`
or `AK00`. An id listed twice with different seats is ambiguous and never resolved.

## Geography keys

|        | key                   | example  |
|--------|-----------------------|----------|
| Senate | state postal code     | `CA`     |
| House  | state FIPS + district | `06012`  |

The district is always three digits. At-large seats (`0`, `00`, `AL`, `At-Large`, `at large`) are `000`.
Senate codes outside the 50 states are dropped. House records from a state outside the FIPS table
(50 states, DC and 5 territories) are dropped.

## Votes

| vote       | accepted texts (case and spacing do not matter)                    |
|------------|--------------------------------------------------------------------|
| Yea        | `Yea`, `Aye`, `Yes`                                                |
| Nay        | `Nay`, `No`                                                        |
| Present    | `Present`                                                          |
| Not Voting | `Not Voting`, `NotVoting`, `NV`, `Absent`, `Excused`, empty, none  |

Any other text is counted as Not Voting and reported in the diagnostics.

## Joining

The geometry is the driving side: every state or district of the geometry file appears once in the
output, with or without a vote. A row without a vote has no data, which is not the same as Not Voting.

- Senate: the votes of a state are kept as a pair, in feed order. A state with one vote is padded with
Not Voting. If more than two votes are found, only the first two are kept.
- House: a district has one vote. If the same district appears more than once, the first record in
feed order wins and the other ones are dropped.

## Diagnostics

Nothing in the reconciliation stops a run. Dropped records are logged and counted:
unresolved identities, unrecognized vote texts, duplicate House keys, truncated Senate states,
votes without a geometry row and geometry rows without a vote.

*/
